use projecthub_core::{
    open_db, HubConfig, JoinRequest, KvStore, MemoryKvStore, ProjectDraft, ProjectHub,
    ProjectQuery, RegisterRequest, RepoError, RepoResult, SqliteKvStore,
};
use std::cell::Cell;

fn cheap_config() -> HubConfig {
    HubConfig {
        password_memory_kib: 1024,
        password_iterations: 1,
        ..HubConfig::default()
    }
}

fn register<S: KvStore + ?Sized>(hub: &mut ProjectHub<'_, S>, name: &str) {
    hub.register(&RegisterRequest {
        name: name.to_string(),
        surname: "Example".to_string(),
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password: format!("{name}-pw"),
    })
    .unwrap();
}

#[test]
fn alice_and_bob_thread_end_to_end() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    register(&mut hub, "bob");

    hub.login("alice", "alice-pw").unwrap();
    let demo = hub
        .create_project(ProjectDraft {
            title: "Demo".to_string(),
            description: "A demo project".to_string(),
            tags: vec!["x".to_string()],
            ..ProjectDraft::default()
        })
        .unwrap();
    hub.logout().unwrap();

    hub.login("bob", "bob-pw").unwrap();
    let hi = hub.join(demo.id, JoinRequest::comment("hi")).unwrap();
    hub.logout().unwrap();

    hub.login("alice", "alice-pw").unwrap();
    hub.reply(demo.id, hi.id, "thanks").unwrap();

    let detail = hub.project_detail(demo.id).unwrap();
    assert_eq!(detail.thread.len(), 1);
    let root = &detail.thread[0];
    assert_eq!(root.record.name, "bob");
    assert_eq!(root.record.comment.as_deref(), Some("hi"));
    assert_eq!(root.replies.len(), 1);
    assert_eq!(root.replies[0].record.name, "alice");
    assert_eq!(root.replies[0].record.comment.as_deref(), Some("thanks"));
    assert!(root.replies[0].replies.is_empty());
}

#[test]
fn deleting_project_drops_its_records_and_counter() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    hub.login("alice", "alice-pw").unwrap();

    let doomed = hub
        .create_project(ProjectDraft {
            title: "Doomed".to_string(),
            description: "d".to_string(),
            ..ProjectDraft::default()
        })
        .unwrap();
    let kept = hub
        .create_project(ProjectDraft {
            title: "Kept".to_string(),
            description: "d".to_string(),
            ..ProjectDraft::default()
        })
        .unwrap();
    hub.join(doomed.id, JoinRequest::comment("bye")).unwrap();
    hub.join(kept.id, JoinRequest::comment("stay")).unwrap();
    hub.toggle_like(doomed.id).unwrap();

    hub.delete_project(doomed.id).unwrap();

    assert_eq!(hub.like_count(doomed.id), 0);
    assert!(!store.get("projectLikes").unwrap().unwrap().contains(&doomed.id.to_string()));
    let participants = store.get("participants").unwrap().unwrap();
    assert!(!participants.contains(&doomed.id.to_string()));
    assert_eq!(hub.project_detail(kept.id).unwrap().participant_count, 1);
    let alice = hub.current_user().unwrap().id;
    assert!(hub.liked_projects(alice).unwrap().is_empty());
}

/// Memory store that rejects writes to `projects` while `fail_projects` is set.
struct FailingProjectsStore {
    inner: MemoryKvStore,
    fail_projects: Cell<bool>,
}

impl KvStore for FailingProjectsStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        if self.fail_projects.get() && key == "projects" {
            return Err(RepoError::UninitializedConnection {
                expected_version: 1,
                actual_version: 0,
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.inner.remove(key)
    }
}

#[test]
fn failed_project_delete_leaves_no_orphans_and_retry_finishes() {
    let store = FailingProjectsStore {
        inner: MemoryKvStore::new(),
        fail_projects: Cell::new(false),
    };
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    hub.login("alice", "alice-pw").unwrap();
    let project = hub
        .create_project(ProjectDraft {
            title: "Fragile".to_string(),
            description: "d".to_string(),
            ..ProjectDraft::default()
        })
        .unwrap();
    hub.join(project.id, JoinRequest::comment("hello")).unwrap();
    hub.toggle_like(project.id).unwrap();

    store.fail_projects.set(true);
    let err = hub.delete_project(project.id).unwrap_err();
    assert_eq!(err.code(), "storage_error");
    assert!(hub.project(project.id).is_some());
    assert_eq!(hub.project_detail(project.id).unwrap().participant_count, 0);
    assert_eq!(hub.like_count(project.id), 0);

    store.fail_projects.set(false);
    hub.delete_project(project.id).unwrap();
    assert!(hub.project(project.id).is_none());
}

#[test]
fn state_survives_reopening_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projecthub.db");
    let config = HubConfig {
        db_path: path.clone(),
        ..cheap_config()
    };

    let project_id = {
        let conn = open_db(&path).unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();
        let mut hub = ProjectHub::open(&store, &config).unwrap();
        register(&mut hub, "alice");
        hub.login("alice", "alice-pw").unwrap();
        let project = hub
            .create_project(ProjectDraft {
                title: "Persistent".to_string(),
                description: "d".to_string(),
                tags: vec!["db".to_string()],
                ..ProjectDraft::default()
            })
            .unwrap();
        hub.join(project.id, JoinRequest::comment("first")).unwrap();
        hub.toggle_like(project.id).unwrap();
        project.id
    };

    let conn = open_db(&path).unwrap();
    let store = SqliteKvStore::try_new(&conn).unwrap();
    let hub = ProjectHub::open(&store, &config).unwrap();

    assert_eq!(hub.current_user().map(|user| user.username.as_str()), Some("alice"));
    assert_eq!(hub.projects(&ProjectQuery::default()).count(), 1);
    assert_eq!(hub.available_tags(), vec!["db"]);
    let detail = hub.project_detail(project_id).unwrap();
    assert_eq!(detail.like_count, 1);
    assert!(detail.liked);
    assert_eq!(detail.thread[0].record.comment.as_deref(), Some("first"));
    assert_eq!(
        store.keys().unwrap(),
        vec![
            "loggedInUser".to_string(),
            "participants".to_string(),
            "projectLikes".to_string(),
            "projects".to_string(),
            format!("userLikes_{}", hub.current_user().unwrap().id),
            "users".to_string(),
        ]
    );
}

#[test]
fn stored_layout_uses_camel_case_fields() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    hub.login("alice", "alice-pw").unwrap();
    let project = hub
        .create_project(ProjectDraft {
            title: "Demo".to_string(),
            description: "d".to_string(),
            image_url: Some("https://example.com/a.png".to_string()),
            ..ProjectDraft::default()
        })
        .unwrap();
    let root = hub.join(project.id, JoinRequest::comment("hi")).unwrap();
    hub.reply(project.id, root.id, "re").unwrap();

    let projects = store.get("projects").unwrap().unwrap();
    assert!(projects.contains("\"ownerId\""));
    assert!(projects.contains("\"imageUrl\""));
    assert!(projects.contains("\"createdAt\""));
    assert!(projects.contains("\"planning\""));

    let participants = store.get("participants").unwrap().unwrap();
    assert!(participants.contains("\"projectId\""));
    assert!(participants.contains("\"userId\""));
    assert!(participants.contains("\"parentId\""));

    let users = store.get("users").unwrap().unwrap();
    assert!(users.contains("\"passwordHash\""));
}
