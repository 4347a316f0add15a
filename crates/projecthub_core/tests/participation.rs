use projecthub_core::{
    HubConfig, HubError, JoinRequest, KvStore, MemoryKvStore, Project, ProjectDraft, ProjectHub,
    RegisterRequest,
};
use uuid::Uuid;

fn cheap_config() -> HubConfig {
    HubConfig {
        password_memory_kib: 1024,
        password_iterations: 1,
        ..HubConfig::default()
    }
}

fn register<S: KvStore + ?Sized>(hub: &mut ProjectHub<'_, S>, username: &str) {
    hub.register(&RegisterRequest {
        name: username.to_string(),
        surname: "Tester".to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "secret".to_string(),
    })
    .unwrap();
}

fn switch_to<S: KvStore + ?Sized>(hub: &mut ProjectHub<'_, S>, username: &str) {
    hub.logout().unwrap();
    hub.login(username, "secret").unwrap();
}

fn seeded_project<S: KvStore + ?Sized>(hub: &mut ProjectHub<'_, S>) -> Project {
    for username in ["alice", "bob", "mallory", "admin"] {
        register(hub, username);
    }
    hub.login("alice", "secret").unwrap();
    hub.create_project(ProjectDraft {
        title: "Demo".to_string(),
        description: "desc".to_string(),
        tags: vec!["x".to_string()],
        ..ProjectDraft::default()
    })
    .unwrap()
}

fn participation_code(err: HubError) -> &'static str {
    match err {
        HubError::Participation(inner) => inner.code(),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn join_requires_login_and_existing_project() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let project = seeded_project(&mut hub);
    hub.logout().unwrap();

    let err = hub.join(project.id, JoinRequest::join()).unwrap_err();
    assert_eq!(participation_code(err), "unauthenticated");

    hub.login("bob", "secret").unwrap();
    let err = hub.join(Uuid::new_v4(), JoinRequest::join()).unwrap_err();
    assert_eq!(participation_code(err), "not_found");

    let record = hub.join(project.id, JoinRequest::comment("  ")).unwrap();
    assert_eq!(record.comment, None);
    assert_eq!(record.name, "bob");
    assert!(hub.has_joined(project.id, record.user_id));
}

#[test]
fn replying_alone_does_not_count_as_joined() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let project = seeded_project(&mut hub);

    switch_to(&mut hub, "bob");
    let root = hub.join(project.id, JoinRequest::comment("root")).unwrap();

    switch_to(&mut hub, "mallory");
    let reply = hub.reply(project.id, root.id, "me too").unwrap();
    assert!(!hub.has_joined(project.id, reply.user_id));
    assert!(hub.has_joined(project.id, root.user_id));

    let joined = hub.join(project.id, JoinRequest::join()).unwrap();
    assert!(hub.has_joined(project.id, joined.user_id));
}

#[test]
fn reply_parent_must_belong_to_same_project() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let demo = seeded_project(&mut hub);
    let other = hub
        .create_project(ProjectDraft {
            title: "Other".to_string(),
            description: "desc".to_string(),
            ..ProjectDraft::default()
        })
        .unwrap();
    let foreign = hub.join(other.id, JoinRequest::comment("elsewhere")).unwrap();

    let err = hub.reply(demo.id, foreign.id, "cross").unwrap_err();
    assert_eq!(participation_code(err), "parent_not_found");
    let err = hub.reply(demo.id, Uuid::now_v7(), "ghost").unwrap_err();
    assert_eq!(participation_code(err), "parent_not_found");
}

#[test]
fn delete_cascades_to_nested_replies() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let project = seeded_project(&mut hub);

    switch_to(&mut hub, "bob");
    let root = hub.join(project.id, JoinRequest::comment("root")).unwrap();
    let keep = hub.join(project.id, JoinRequest::comment("keep")).unwrap();
    let child = hub.reply(project.id, root.id, "child").unwrap();
    let grandchild = hub.reply(project.id, child.id, "grandchild").unwrap();

    switch_to(&mut hub, "alice");
    let removed = hub.delete_participant(root.id).unwrap();
    assert_eq!(removed, vec![root.id, child.id, grandchild.id]);

    let detail = hub.project_detail(project.id).unwrap();
    assert_eq!(detail.participant_count, 1);
    assert_eq!(detail.thread.len(), 1);
    assert_eq!(detail.thread[0].record.id, keep.id);

    let err = hub.delete_participant(root.id).unwrap_err();
    assert_eq!(participation_code(err), "not_found");
}

#[test]
fn non_owner_cannot_moderate_and_store_is_untouched() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let project = seeded_project(&mut hub);

    switch_to(&mut hub, "bob");
    let record = hub.join(project.id, JoinRequest::comment("hi")).unwrap();
    let before = store.get("participants").unwrap();

    let err = hub.delete_participant(record.id).unwrap_err();
    assert_eq!(participation_code(err), "forbidden");
    let err = hub.clear_participants(project.id).unwrap_err();
    assert_eq!(participation_code(err), "forbidden");

    switch_to(&mut hub, "mallory");
    let err = hub.clear_participants(project.id).unwrap_err();
    assert_eq!(participation_code(err), "forbidden");
    assert_eq!(store.get("participants").unwrap(), before);
}

#[test]
fn admin_and_owner_can_clear_all_records() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let project = seeded_project(&mut hub);

    switch_to(&mut hub, "bob");
    let first = hub.join(project.id, JoinRequest::comment("one")).unwrap();
    hub.reply(project.id, first.id, "two").unwrap();

    switch_to(&mut hub, "admin");
    assert_eq!(hub.clear_participants(project.id).unwrap(), 2);

    switch_to(&mut hub, "bob");
    hub.join(project.id, JoinRequest::join()).unwrap();
    switch_to(&mut hub, "alice");
    assert_eq!(hub.clear_participants(project.id).unwrap(), 1);
    assert_eq!(hub.project_detail(project.id).unwrap().participant_count, 0);
}

#[test]
fn project_detail_summarizes_participation() {
    let store = MemoryKvStore::new();
    let mut hub = ProjectHub::open(&store, &cheap_config()).unwrap();
    let project = seeded_project(&mut hub);

    let empty = hub.project_detail(project.id).unwrap();
    assert_eq!(empty.owner_username, Some("alice"));
    assert_eq!(empty.last_activity, None);
    assert!(empty.participants.is_empty());

    switch_to(&mut hub, "bob");
    let joined = hub.join(project.id, JoinRequest::join()).unwrap();
    let reply = hub.reply(project.id, joined.id, "welcome?").unwrap();

    let detail = hub.project_detail(project.id).unwrap();
    assert_eq!(detail.participants.len(), 1);
    assert_eq!(detail.participants[0].id, joined.id);
    assert_eq!(detail.participant_count, 2);
    assert_eq!(detail.last_activity, Some(reply.created_at.max(joined.created_at)));
}
