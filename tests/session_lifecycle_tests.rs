use cim_cli::{
    AggregateRoot, CoreConfig, DomainService, Session, SessionStatus, SharedSession,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn service() -> DomainService {
    DomainService::new(CoreConfig::default())
}

#[test]
fn test_session_keeps_commands_in_insertion_order() {
    let service = service();
    let mut session = service.create_session(Some("alice")).unwrap();
    let ids: Vec<_> = ["pwd", "ls", "cd /tmp"]
        .into_iter()
        .map(|line| {
            let command = service.create_command(line).unwrap();
            service.add_command_to_session(&mut session, &command).unwrap();
            command.id()
        })
        .collect();

    assert_eq!(session.user_id(), "alice");
    assert_eq!(session.commands(), ids.as_slice());
    assert_eq!(session.commands_executed(), 3);
    assert_eq!(session.version(), 3);
}

#[test]
fn test_end_session_twice_returns_same_end_time() {
    let service = service();
    let mut session = service.create_session(None).unwrap();

    let first = service.end_session(&mut session).unwrap().end_time();
    let second = service.end_session(&mut session).unwrap().end_time();

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(session.status(), SessionStatus::Ended);
    assert!(!session.is_active());
}

#[test]
fn test_ended_session_still_accepts_history() {
    let service = service();
    let mut session = service.create_session(Some("carol")).unwrap();
    let before = service.create_command("git pull").unwrap();
    service.add_command_to_session(&mut session, &before).unwrap();
    service.end_session(&mut session).unwrap();

    let late = service.create_command("git log").unwrap();
    service.add_command_to_session(&mut session, &late).unwrap();

    assert_eq!(session.commands_executed(), 2);
    assert!(session.contains_command(late.id()));
    assert!(service.validate_business_rules(&session).is_ok());
}

#[test]
fn test_user_id_is_trimmed() {
    let session = service().create_session(Some("  dave ")).unwrap();
    assert_eq!(session.user_id(), "dave");
}

#[test]
fn test_session_record_round_trips() {
    let service = service();
    let mut session = service.create_session(Some("erin")).unwrap();
    let command = service.create_command("uptime").unwrap();
    service.add_command_to_session(&mut session, &command).unwrap();
    service.end_session(&mut session).unwrap();

    let record = session.to_record().unwrap();
    assert_eq!(record["status"], "ended");
    assert_eq!(record["commands_executed"], 1);
    assert_eq!(record["commands"][0], command.id().to_string());

    let restored: Session = serde_json::from_value(record).unwrap();
    assert_eq!(restored, session);
}

#[test]
fn test_shared_session_snapshot_reflects_append() {
    let service = service();
    let shared: SharedSession = Arc::new(Mutex::new(service.create_session(None).unwrap()));
    let command = service.create_command("hostname").unwrap();

    let snapshot = service
        .add_command_to_shared_session(&shared, &command)
        .unwrap();

    assert_eq!(snapshot.commands_executed(), 1);
    assert_eq!(*shared.lock().unwrap(), snapshot);

    let err = service
        .add_command_to_shared_session(&shared, &command)
        .unwrap_err();
    assert!(err.to_string().contains("already added"), "{err}");
    assert_eq!(shared.lock().unwrap().commands_executed(), 1);
}
