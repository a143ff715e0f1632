//! Full-mode runs.

use std::fs;

use classweave_lib::execute::ExecuteError;
use classweave_lib::input::{DirectoryUnit, JarUnit, Scope, TransformInput, Unit};
use classweave_lib::invocation::{InvocationError, TransformMode};
use classweave_lib::transform::TransformerRegistry;

use super::common::{Append, FailOn, TestEnv, marking_registry, read_jar, snapshot};

fn sample_inputs(env: &TestEnv) -> Vec<TransformInput> {
  env.write_file("classes/com/app/Main.class", "main");
  env.write_file("classes/com/app/strings.xml", "<resources/>");
  env.write_file("generated/R.class", "r");
  let okio = env.write_jar(
    "libs/okio.jar",
    &[("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n"), ("okio/Buffer.class", "buffer")],
  );
  let gson = env.write_jar("libs/gson.jar", &[("com/google/gson/Gson.class", "gson")]);

  vec![
    TransformInput::new()
      .with_directory(DirectoryUnit::new("classes", env.path("classes")))
      .with_jar(JarUnit::new("okio", okio)),
    TransformInput::new()
      .with_directory(DirectoryUnit::new("generated", env.path("generated")).with_scopes([Scope::SubProjects]))
      .with_jar(JarUnit::new("gson", gson).with_scopes([Scope::ExternalLibraries])),
  ]
}

#[test]
fn every_unit_is_written_exactly_once() {
  let env = TestEnv::new();
  let inputs = sample_inputs(&env);
  let outputs = env.outputs();

  let summary = env.run(marking_registry(), TransformMode::Full, inputs.clone()).unwrap();
  assert_eq!(summary.units_processed, 4);

  let classes = Unit::Directory(&inputs[0].directories[0]).location(&outputs);
  assert_eq!(fs::read(classes.join("com/app/Main.class")).unwrap(), b"main+");
  assert_eq!(fs::read(classes.join("com/app/strings.xml")).unwrap(), b"<resources/>");

  let generated = Unit::Directory(&inputs[1].directories[0]).location(&outputs);
  assert_eq!(fs::read(generated.join("R.class")).unwrap(), b"r+");

  let okio = Unit::Jar(&inputs[0].jars[0]).location(&outputs);
  assert_eq!(
    read_jar(&okio),
    vec![
      ("META-INF/MANIFEST.MF".to_string(), b"Manifest-Version: 1.0\n".to_vec()),
      ("okio/Buffer.class".to_string(), b"buffer+".to_vec()),
    ]
  );

  let gson = Unit::Jar(&inputs[1].jars[0]).location(&outputs);
  assert_eq!(read_jar(&gson), vec![("com/google/gson/Gson.class".to_string(), b"gson+".to_vec())]);
}

#[test]
fn repeated_full_runs_are_byte_identical() {
  let env = TestEnv::new();
  let inputs = sample_inputs(&env);

  env.run(marking_registry(), TransformMode::Full, inputs.clone()).unwrap();
  let first = snapshot(&env.out());
  env.run(marking_registry(), TransformMode::Full, inputs).unwrap();
  let second = snapshot(&env.out());

  assert!(!first.is_empty());
  assert_eq!(first, second);
}

#[test]
fn no_transformers_copies_units_through() {
  let env = TestEnv::new();
  let inputs = sample_inputs(&env);
  let outputs = env.outputs();

  env.run(TransformerRegistry::empty(), TransformMode::Full, inputs.clone()).unwrap();

  let classes = Unit::Directory(&inputs[0].directories[0]).location(&outputs);
  assert_eq!(fs::read(classes.join("com/app/Main.class")).unwrap(), b"main");
  let okio = Unit::Jar(&inputs[0].jars[0]).location(&outputs);
  assert_eq!(read_jar(&okio)[1], ("okio/Buffer.class".to_string(), b"buffer".to_vec()));
}

#[test]
fn chain_follows_priority_then_registration() {
  let env = TestEnv::new();
  env.write_file("classes/A.class", "x");
  let inputs = vec![TransformInput::new().with_directory(DirectoryUnit::new("classes", env.path("classes")))];
  let registry = TransformerRegistry::builder()
    .register_with_priority(10, Append::new("late", "3"))
    .register(Append::new("first-default", "1"))
    .register(Append::new("second-default", "2"))
    .register_with_priority(-5, Append::new("early", "0"))
    .build();

  env.run(registry, TransformMode::Full, inputs.clone()).unwrap();

  let dest = Unit::Directory(&inputs[0].directories[0]).location(&env.outputs());
  assert_eq!(fs::read(dest.join("A.class")).unwrap(), b"x0123");
}

#[test]
fn failing_jar_entry_leaves_no_archive_behind() {
  let env = TestEnv::new();
  let jar = env.write_jar("libs/bad.jar", &[("ok/A.class", "fine"), ("bad/B.class", "poison")]);
  let inputs = vec![TransformInput::new().with_jar(JarUnit::new("bad", jar))];
  let registry = TransformerRegistry::builder()
    .register(FailOn { needle: b"poison" })
    .build();

  let err = env.run(registry, TransformMode::Full, inputs.clone()).unwrap_err();

  match err {
    InvocationError::Transform(ExecuteError::Transform { location, source }) => {
      assert!(location.ends_with("!/bad/B.class"), "unexpected location {location}");
      assert_eq!(source.transformer, "fail-on");
    }
    other => panic!("unexpected error: {other}"),
  }
  let dest = Unit::Jar(&inputs[0].jars[0]).location(&env.outputs());
  assert!(!dest.exists());
  let leftovers = snapshot(&env.out());
  assert!(leftovers.is_empty(), "temporary files left behind: {:?}", leftovers.keys());
}

#[test]
fn colliding_destinations_are_rejected_before_any_write() {
  let env = TestEnv::new();
  let first = env.write_jar("a/okio.jar", &[("A.class", "a")]);
  let second = env.write_jar("b/okio.jar", &[("B.class", "b")]);
  let inputs = vec![
    TransformInput::new().with_jar(JarUnit::new("okio", first)),
    TransformInput::new().with_jar(JarUnit::new("okio.jar", second)),
  ];

  let err = env.run(marking_registry(), TransformMode::Full, inputs).unwrap_err();

  assert!(matches!(
    err,
    InvocationError::Transform(ExecuteError::OverlappingOutputs { .. })
  ));
  assert!(!env.out().exists());
}
