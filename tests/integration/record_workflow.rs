//! Integration test: record lifecycle against a real git repository.
//!
//! Uses the in-memory cipher engine so no keyring is needed, and the git
//! engine so every commit lands in an actual repository on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::Level;
use pwstore::{
    Cipher, GitEngine, MemoryEngine, Recipient, RecordService, RecordingReporter, StoreError,
    VcsEngine, VersionedStore,
};

type Service = RecordService<MemoryEngine, GitEngine>;

fn alice() -> Recipient {
    Recipient::new("alice@example.com")
}

fn open(root: &Path) -> (Service, Arc<RecordingReporter>) {
    let reporter = RecordingReporter::new();
    let store = VersionedStore::new(root, GitEngine::new(), reporter.clone());
    let cipher = Cipher::new(MemoryEngine::trusting([alice()]));
    let service = RecordService::open(cipher, store, Some(alice()), reporter.clone())
        .expect("store should open");
    (service, reporter)
}

fn commit_count(root: &Path) -> usize {
    GitEngine::new().history(root, usize::MAX).unwrap().len()
}

fn tracked(root: &Path) -> Vec<PathBuf> {
    GitEngine::new().tracked_paths(root).unwrap()
}

#[test]
fn fresh_store_is_initialized_with_one_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("pwstore");

    let (_service, reporter) = open(&root);
    assert!(GitEngine::new().is_repository(&root));
    assert_eq!(reporter.at(Level::Warn).len(), 1);

    // Re-opening an initialized store is silent.
    let (_again, reporter) = open(&root);
    assert!(reporter.at(Level::Warn).is_empty());
}

#[test]
fn create_then_list_is_empty_and_committed() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let (service, _) = open(root);

    service.create("foo").unwrap();

    assert!(service.list("foo").unwrap().is_empty());
    assert_eq!(tracked(root), vec![PathBuf::from("foo.gpg")]);

    let history = service.history(1).unwrap();
    assert_eq!(history[0].summary, "Created empty record foo.gpg");
}

#[test]
fn create_twice_fails_without_new_commit() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let (service, _) = open(root);

    service.create("foo").unwrap();
    let before = commit_count(root);
    let on_disk = std::fs::read(root.join("foo.gpg")).unwrap();

    let result = service.create("foo");
    assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    assert_eq!(commit_count(root), before);
    assert_eq!(std::fs::read(root.join("foo.gpg")).unwrap(), on_disk);
}

#[test]
fn update_then_get_adds_exactly_one_commit() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let (service, _) = open(root);

    service.create("foo").unwrap();
    let before = commit_count(root);

    let commit = service.update("foo", "url", "example.com").unwrap();
    assert_eq!(commit_count(root), before + 1);
    assert_eq!(service.get("foo", "url").unwrap().as_str(), "example.com");

    let head = service.history(1).unwrap();
    assert_eq!(head[0].id, commit);
    assert_eq!(head[0].summary, "Updated given records to password store.");
}

#[test]
fn update_overwrites_and_lists_all_keys() {
    let tmp = tempfile::tempdir().unwrap();
    let (service, _) = open(tmp.path());

    service.create("site").unwrap();
    service.update("site", "user", "alice").unwrap();
    service.update("site", "password", "old").unwrap();
    service.update("site", "password", "new").unwrap();

    let mut keys = service.list("site").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["password", "user"]);
    assert_eq!(service.get("site", "password").unwrap().as_str(), "new");
    assert_eq!(
        service.select("site").unwrap().as_str(),
        "{\n    \"password\": \"new\",\n    \"user\": \"alice\"\n}"
    );
}

#[test]
fn delete_removes_key_and_commits() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let (service, _) = open(root);

    service.create("site").unwrap();
    service.update("site", "user", "alice").unwrap();
    service.update("site", "pin", "1234").unwrap();
    let before = commit_count(root);

    service.delete("site", "pin").unwrap();
    assert_eq!(commit_count(root), before + 1);
    assert!(matches!(
        service.get("site", "pin"),
        Err(StoreError::KeyNotFound(_))
    ));
    assert_eq!(service.list("site").unwrap(), vec!["user"]);
}

#[test]
fn get_missing_key_is_key_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let (service, _) = open(tmp.path());
    service.create("site").unwrap();
    assert!(matches!(
        service.get("site", "nope"),
        Err(StoreError::KeyNotFound(_))
    ));
}

#[test]
fn operations_on_missing_record_are_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let (service, _) = open(tmp.path());

    assert!(matches!(service.list("ghost"), Err(StoreError::NotFound(_))));
    assert!(matches!(
        service.update("ghost", "k", "v"),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        service.drop_record("ghost"),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        service.alias("ghost", "spook"),
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(commit_count(tmp.path()), 0);
}

#[test]
fn drop_removes_file_and_tracking() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let (service, _) = open(root);

    service.create("foo").unwrap();
    service.create("bar").unwrap();
    service.drop_record("foo").unwrap();

    assert!(!root.join("foo.gpg").exists());
    assert_eq!(tracked(root), vec![PathBuf::from("bar.gpg")]);
    assert!(matches!(
        service.get("foo", "anything"),
        Err(StoreError::NotFound(_))
    ));

    let head = service.history(1).unwrap();
    assert_eq!(head[0].summary, "Dropped record foo.gpg from password store.");
}

#[test]
fn every_mutation_leaves_head_matching_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let (service, _) = open(root);

    service.create("a").unwrap();
    service.create("b").unwrap();
    service.update("a", "k", "v").unwrap();
    service.delete("a", "k").unwrap();
    service.drop_record("b").unwrap();

    let mut on_disk: Vec<PathBuf> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| PathBuf::from(e.unwrap().file_name()))
        .filter(|p| p != Path::new(".git"))
        .collect();
    on_disk.sort();
    assert_eq!(tracked(root), on_disk);
    assert_eq!(commit_count(root), 5);
}

#[cfg(unix)]
mod aliases {
    use super::*;

    #[test]
    fn alias_resolves_to_same_content() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let (service, _) = open(root);

        service.create("github").unwrap();
        service.update("github", "user", "alice").unwrap();
        service.alias("github", "gh").unwrap();

        assert_eq!(service.get("gh", "user").unwrap().as_str(), "alice");
        assert_eq!(
            tracked(root),
            vec![PathBuf::from("gh.gpg"), PathBuf::from("github.gpg")]
        );
        assert!(root
            .join("gh.gpg")
            .symlink_metadata()
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn update_through_alias_keeps_link() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let (service, _) = open(root);

        service.create("github").unwrap();
        service.alias("github", "gh").unwrap();
        service.update("gh", "token", "abc").unwrap();

        assert_eq!(service.get("github", "token").unwrap().as_str(), "abc");
        assert!(root
            .join("gh.gpg")
            .symlink_metadata()
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn update_through_alias_of_alias_reaches_record() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let (service, _) = open(root);

        service.create("github").unwrap();
        service.alias("github", "gh").unwrap();
        service.alias("gh", "gh2").unwrap();

        // The second alias points straight at the record, not at "gh".
        assert_eq!(
            std::fs::read_link(root.join("gh2.gpg")).unwrap(),
            PathBuf::from("github.gpg")
        );

        service.update("gh2", "token", "abc").unwrap();

        for link in ["gh.gpg", "gh2.gpg"] {
            assert!(
                root.join(link)
                    .symlink_metadata()
                    .unwrap()
                    .file_type()
                    .is_symlink(),
                "{link} should still be a link"
            );
        }
        for name in ["github", "gh", "gh2"] {
            assert_eq!(service.get(name, "token").unwrap().as_str(), "abc");
        }
        assert_eq!(
            tracked(root),
            vec![
                PathBuf::from("gh.gpg"),
                PathBuf::from("gh2.gpg"),
                PathBuf::from("github.gpg"),
            ]
        );
    }

    #[test]
    fn drop_is_refused_while_any_alias_leads_to_record() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let (service, _) = open(root);

        service.create("github").unwrap();
        service.alias("github", "gh").unwrap();
        service.alias("gh", "gh2").unwrap();

        match service.drop_record("github") {
            Err(StoreError::Aliased { aliases, .. }) => {
                assert_eq!(aliases, vec!["gh".to_string(), "gh2".to_string()]);
            }
            other => panic!("expected Aliased, got {other:?}"),
        }

        // Each alias is its own link, so either can go first.
        service.drop_record("gh").unwrap();
        assert_eq!(service.get("gh2", "token").unwrap_err().to_string(), "Key not found: token");
        service.drop_record("gh2").unwrap();
        service.drop_record("github").unwrap();
        assert!(tracked(root).is_empty());
    }

    #[test]
    fn alias_name_taken_is_already_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let (service, _) = open(tmp.path());

        service.create("a").unwrap();
        service.create("b").unwrap();
        let before = commit_count(tmp.path());
        assert!(matches!(
            service.alias("a", "b"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(commit_count(tmp.path()), before);
    }

    #[test]
    fn drop_of_aliased_record_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let (service, _) = open(root);

        service.create("github").unwrap();
        service.alias("github", "gh").unwrap();
        let before = commit_count(root);

        match service.drop_record("github") {
            Err(StoreError::Aliased { record, aliases }) => {
                assert_eq!(record, "github");
                assert_eq!(aliases, vec!["gh".to_string()]);
            }
            other => panic!("expected Aliased, got {other:?}"),
        }
        assert!(root.join("github.gpg").exists());
        assert_eq!(commit_count(root), before);

        // Dropping the alias first, then the record, succeeds.
        service.drop_record("gh").unwrap();
        assert!(root.join("github.gpg").exists());
        service.drop_record("github").unwrap();
        assert!(tracked(root).is_empty());
    }

    #[test]
    fn search_finds_records_and_aliases() {
        let tmp = tempfile::tempdir().unwrap();
        let (service, _) = open(tmp.path());

        service.create("GitHub").unwrap();
        service.create("mail").unwrap();
        service.alias("GitHub", "gh-work").unwrap();

        let found: Vec<String> = service
            .search("g")
            .unwrap()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        // Every file name ends in ".gpg", so "g" matches them all.
        assert_eq!(found, vec!["GitHub", "gh-work", "mail"]);

        let found: Vec<String> = service
            .search("HUB")
            .unwrap()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(found, vec!["GitHub"]);
    }
}
