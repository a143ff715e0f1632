//! Skipping, idempotent deletes, unrecorded directories and manifest-driven runs.

use std::fs;
use std::sync::Arc;

use classweave_lib::execute::WorkerPool;
use classweave_lib::input::{DirectoryUnit, JarUnit, Status, TransformInput, Unit};
use classweave_lib::invocation::{InvocationPhase, TransformMode};
use classweave_lib::manifest::HostManifest;

use super::common::{Counting, TestEnv, counting_registry, marking_registry, read_jar, snapshot};

#[test]
fn nothing_changed_means_nothing_read_or_written() {
  let env = TestEnv::new();
  env.write_file("classes/A.class", "a");
  let jar = env.write_jar("libs/lib.jar", &[("L.class", "l")]);
  let classes = env.path("classes");
  env
    .run(
      marking_registry(),
      TransformMode::Full,
      vec![
        TransformInput::new()
          .with_directory(DirectoryUnit::new("classes", &classes))
          .with_jar(JarUnit::new("lib", &jar)),
      ],
    )
    .unwrap();
  let before = snapshot(&env.out());

  let counting = Arc::new(Counting::default());
  let unchanged = vec![
    TransformInput::new()
      .with_directory(DirectoryUnit::new("classes", &classes).with_no_changes())
      .with_jar(JarUnit::new("lib", &jar).with_status(Status::Unchanged)),
  ];
  let summary = env
    .run(counting_registry(&counting), TransformMode::Incremental, unchanged)
    .unwrap();

  assert_eq!(counting.calls(), 0);
  assert_eq!(summary.units_skipped, 2);
  assert_eq!(summary.files_written, 0);
  assert_eq!(snapshot(&env.out()), before);
}

#[test]
fn repeated_removal_is_harmless() {
  let env = TestEnv::new();
  env.write_file("classes/Old.class", "old");
  let jar = env.write_jar("libs/old.jar", &[("O.class", "o")]);
  let classes = env.path("classes");
  env
    .run(
      marking_registry(),
      TransformMode::Full,
      vec![
        TransformInput::new()
          .with_directory(DirectoryUnit::new("classes", &classes))
          .with_jar(JarUnit::new("old", &jar)),
      ],
    )
    .unwrap();

  let removal = vec![
    TransformInput::new()
      .with_directory(DirectoryUnit::new("classes", &classes).with_changed_file("Old.class", Status::Removed))
      .with_jar(JarUnit::new("old", &jar).with_status(Status::Removed)),
  ];
  let outputs = env.outputs();
  let dir_dest = Unit::Directory(&removal[0].directories[0]).location(&outputs);
  let jar_dest = Unit::Jar(&removal[0].jars[0]).location(&outputs);

  let first = env.run(marking_registry(), TransformMode::Incremental, removal.clone()).unwrap();
  assert_eq!(first.files_deleted, 2);
  assert!(!dir_dest.join("Old.class").exists());
  assert!(!jar_dest.exists());

  let second = env.run(marking_registry(), TransformMode::Incremental, removal).unwrap();
  assert_eq!(second.files_deleted, 0);
}

#[test]
fn directory_without_change_record_is_processed_whole() {
  let env = TestEnv::new();
  env.write_file("generated/a/A.class", "a");
  env.write_file("generated/b/B.class", "b");
  env.write_file("generated/b/data.bin", "data");
  let unit = DirectoryUnit::new("generated", env.path("generated"));
  let dest = Unit::Directory(&unit).location(&env.outputs());

  let summary = env
    .run(
      marking_registry(),
      TransformMode::Incremental,
      vec![TransformInput::new().with_directory(unit)],
    )
    .unwrap();

  assert_eq!(summary.files_written, 3);
  assert_eq!(fs::read(dest.join("a/A.class")).unwrap(), b"a+");
  assert_eq!(fs::read(dest.join("b/B.class")).unwrap(), b"b+");
  assert_eq!(fs::read(dest.join("b/data.bin")).unwrap(), b"data");
}

#[test]
fn manifest_drives_a_complete_invocation() {
  let env = TestEnv::new();
  env.write_file("project/build/classes/Main.class", "main");
  env.write_jar("project/libs/okio.jar", &[("okio/Buffer.class", "buffer")]);
  let manifest = serde_json::json!({
    "name": "release",
    "project_dir": "project",
    "output_dir": "project/build/out",
    "properties": { "weave.enabled": "true" },
    "inputs": [{
      "directories": [{ "name": "classes", "path": "project/build/classes" }],
      "jars": [{ "name": "okio", "path": "project/libs/okio.jar" }]
    }]
  });
  let manifest_path = env.write_file("weave.json", serde_json::to_vec(&manifest).unwrap());

  let manifest = HostManifest::load(&manifest_path).unwrap();
  let temporary_dir = manifest.context_config().temporary_dir;
  let outputs = manifest.output_provider();
  let inputs = manifest.inputs.clone();
  let mut invocation = manifest.into_invocation(marking_registry(), WorkerPool::new(2).unwrap());

  assert_eq!(invocation.context().get_property("weave.enabled").as_deref(), Some("true"));
  let summary = invocation.run().unwrap();

  assert_eq!(invocation.phase(), InvocationPhase::Finished);
  assert_eq!(summary.units_processed, 2);
  assert!(temporary_dir.is_dir());
  let classes = Unit::Directory(&inputs[0].directories[0]).location(&outputs);
  assert_eq!(fs::read(classes.join("Main.class")).unwrap(), b"main+");
  let okio = Unit::Jar(&inputs[0].jars[0]).location(&outputs);
  assert_eq!(read_jar(&okio), vec![("okio/Buffer.class".to_string(), b"buffer+".to_vec())]);
}
