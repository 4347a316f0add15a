use projecthub_core::service::project_service::ProjectServiceError;
use projecthub_core::{
    HubConfig, HubError, KvStore, MemoryKvStore, Project, ProjectDraft, ProjectHub, ProjectPatch,
    ProjectQuery, ProjectStatus, RegisterRequest, SortOrder, UserProfile,
};

fn cheap_config() -> HubConfig {
    HubConfig {
        password_memory_kib: 1024,
        password_iterations: 1,
        ..HubConfig::default()
    }
}

fn register<S: KvStore + ?Sized>(hub: &mut ProjectHub<'_, S>, username: &str) -> UserProfile {
    hub.register(&RegisterRequest {
        name: username.to_string(),
        surname: "Tester".to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "secret".to_string(),
    })
    .unwrap()
}

fn draft(title: &str, tags: &[&str]) -> ProjectDraft {
    ProjectDraft {
        title: title.to_string(),
        description: format!("{title} description"),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        ..ProjectDraft::default()
    }
}

fn project_code(err: HubError) -> &'static str {
    match err {
        HubError::Project(inner) => inner.code(),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_requires_login_and_applies_defaults() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let alice = register(&mut hub, "alice");

    let err = hub.create_project(draft("Demo", &["x"])).unwrap_err();
    assert_eq!(project_code(err), "unauthenticated");

    hub.login("alice", "secret").unwrap();
    let project = hub
        .create_project(ProjectDraft {
            title: "  Demo  ".to_string(),
            description: "desc".to_string(),
            tags: vec![" x ".to_string(), "x".to_string(), "".to_string()],
            image_url: Some("   ".to_string()),
            ..ProjectDraft::default()
        })
        .unwrap();

    assert_eq!(project.title, "Demo");
    assert_eq!(project.status, ProjectStatus::Planning);
    assert_eq!(project.tags, vec!["x"]);
    assert_eq!(project.image_url, None);
    assert_eq!(project.owner_id, alice.id);
    assert!(project.created_at > 0);
    assert_eq!(hub.project(project.id), Some(&project));
}

#[test]
fn blank_title_or_description_is_rejected_and_nothing_persists() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    hub.login("alice", "secret").unwrap();

    let mut no_title = draft("x", &[]);
    no_title.title = " ".to_string();
    match hub.create_project(no_title).unwrap_err() {
        HubError::Project(ProjectServiceError::MissingRequiredField(field)) => {
            assert_eq!(field, "title")
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut no_description = draft("x", &[]);
    no_description.description = String::new();
    let err = hub.create_project(no_description).unwrap_err();
    assert_eq!(project_code(err), "missing_required_field");

    assert!(store.get("projects").unwrap().is_none());
    assert!(hub.projects(&ProjectQuery::default()).is_empty());
}

#[test]
fn update_is_owner_only_and_keeps_absent_fields() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    register(&mut hub, "admin");
    hub.login("alice", "secret").unwrap();
    let project = hub.create_project(draft("Demo", &["x"])).unwrap();

    let updated = hub
        .update_project(
            project.id,
            ProjectPatch {
                status: Some(ProjectStatus::InProgress),
                tags: Some(vec!["y".to_string()]),
                ..ProjectPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Demo");
    assert_eq!(updated.status, ProjectStatus::InProgress);
    assert_eq!(updated.tags, vec!["y"]);

    let err = hub
        .update_project(
            project.id,
            ProjectPatch {
                description: Some("  ".to_string()),
                ..ProjectPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(project_code(err), "missing_required_field");
    assert_eq!(hub.project(project.id), Some(&updated));

    hub.logout().unwrap();
    hub.login("admin", "secret").unwrap();
    let err = hub
        .update_project(project.id, ProjectPatch::default())
        .unwrap_err();
    assert_eq!(project_code(err), "forbidden");

    let err = hub
        .update_project(uuid::Uuid::new_v4(), ProjectPatch::default())
        .unwrap_err();
    assert_eq!(project_code(err), "not_found");
}

#[test]
fn delete_allows_owner_and_admin_only() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    register(&mut hub, "mallory");
    register(&mut hub, "admin");

    hub.login("alice", "secret").unwrap();
    let first = hub.create_project(draft("First", &[])).unwrap();
    let second = hub.create_project(draft("Second", &[])).unwrap();
    hub.logout().unwrap();

    hub.login("mallory", "secret").unwrap();
    let before = store.get("projects").unwrap();
    let err = hub.delete_project(first.id).unwrap_err();
    assert_eq!(project_code(err), "forbidden");
    assert_eq!(store.get("projects").unwrap(), before);
    hub.logout().unwrap();

    hub.login("admin", "secret").unwrap();
    assert_eq!(hub.delete_project(first.id).unwrap().id, first.id);
    hub.logout().unwrap();

    hub.login("alice", "secret").unwrap();
    hub.delete_project(second.id).unwrap();
    let err = hub.delete_project(second.id).unwrap_err();
    assert_eq!(project_code(err), "not_found");
    assert!(hub.projects(&ProjectQuery::default()).is_empty());
}

#[test]
fn tag_filter_returns_supersets_only() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    hub.login("alice", "secret").unwrap();
    hub.create_project(draft("ab", &["A", "B"])).unwrap();
    hub.create_project(draft("abc", &["C", "B", "A"])).unwrap();
    hub.create_project(draft("a", &["A"])).unwrap();
    hub.create_project(draft("none", &[])).unwrap();

    let query = ProjectQuery::default()
        .tag("A")
        .tag("B")
        .sort(SortOrder::Unspecified);
    let titles: Vec<String> = hub
        .projects(&query)
        .iter()
        .map(|project| project.title.clone())
        .collect();
    assert_eq!(titles, vec!["ab", "abc"]);

    assert_eq!(hub.available_tags(), vec!["A", "B", "C"]);
}

#[test]
fn search_and_featured_pick() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    assert!(hub.featured_project(7).is_none());

    register(&mut hub, "alice");
    hub.login("alice", "secret").unwrap();
    let rust = hub.create_project(draft("Rust Parser", &[])).unwrap();
    let web = hub.create_project(draft("Web Shop", &[])).unwrap();

    let found: Vec<&Project> = hub
        .projects(&ProjectQuery::default().search("parser"))
        .iter()
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, rust.id);

    assert_eq!(hub.featured_project(0).map(|p| p.id), Some(rust.id));
    assert_eq!(hub.featured_project(3).map(|p| p.id), Some(web.id));
}

#[test]
fn profile_lists_owned_projects() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    register(&mut hub, "alice");
    register(&mut hub, "bob");
    hub.login("alice", "secret").unwrap();
    hub.create_project(draft("Mine", &[])).unwrap();
    hub.logout().unwrap();
    hub.login("bob", "secret").unwrap();
    hub.create_project(draft("Bobs", &[])).unwrap();

    let view = hub.profile("alice").unwrap();
    assert_eq!(view.project_count, 1);
    assert_eq!(view.projects[0].title, "Mine");
    assert_eq!(view.image, None);
    assert!(view.avatar_url.contains("name=AT"));
}
