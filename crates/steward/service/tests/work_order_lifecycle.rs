//! End-to-end exercise of the service: seed the role catalogue, staff the
//! facility, run a work order from creation through staged approvals to
//! closure, and read the histories back.

use chrono::{Duration, Utc};
use std::sync::Arc;
use steward_identity::{Blake3PasswordHasher, NewUser};
use steward_service::capability::seed_default_rbac;
use steward_service::{CreateWorkOrderRequest, Steward, SubmitSessionRequest};
use steward_session::{LoginOutcome, SessionToken};
use steward_types::{CoreError, LocationId, RoleId, RoomId, UserId};
use steward_workorder::{CompletionOutcome, InMemoryRoomDirectory, TemplateEntry};

struct Facility {
    steward: Steward,
    manager: UserId,
    cleaner: UserId,
    inspector: UserId,
    admin: UserId,
    cleaner_role: RoleId,
    inspector_role: RoleId,
}

fn template(names: &[&str]) -> Vec<TemplateEntry> {
    names
        .iter()
        .map(|name| TemplateEntry {
            name: name.to_string(),
            image_ref: None,
        })
        .collect()
}

/// Room r-101 at location hq with a three-item template; four staff members.
/// The inspector also holds the Cleaner role, so their login requires role
/// selection.
fn facility() -> Facility {
    let rooms = Arc::new(InMemoryRoomDirectory::new());
    rooms
        .add_room(
            RoomId::new("r-101"),
            LocationId::new("hq"),
            template(&["sweep floor", "mop floor", "clean windows"]),
        )
        .unwrap();

    let steward = Steward::new(rooms);
    let defaults = seed_default_rbac(steward.roles()).unwrap();

    let hasher = Blake3PasswordHasher::new();
    let add = |username: &str| {
        steward
            .users()
            .create_user(
                NewUser {
                    username: username.to_string(),
                    password: "pw".to_string(),
                    email: format!("{}@facility.test", username),
                    phone: "555-0100".to_string(),
                    address_ref: None,
                },
                &hasher,
            )
            .unwrap()
            .id
    };
    let manager = add("mona");
    let cleaner = add("carl");
    let inspector = add("ida");
    let admin = add("root");

    let roles = steward.roles();
    roles.assign_role(&manager, &defaults.manager.id).unwrap();
    roles.assign_role(&cleaner, &defaults.cleaner.id).unwrap();
    roles.assign_role(&inspector, &defaults.inspector.id).unwrap();
    roles.assign_role(&inspector, &defaults.cleaner.id).unwrap();
    roles.assign_role(&admin, &defaults.admin.id).unwrap();

    Facility {
        steward,
        manager,
        cleaner,
        inspector,
        admin,
        cleaner_role: defaults.cleaner.id,
        inspector_role: defaults.inspector.id,
    }
}

fn login_single(steward: &Steward, username: &str) -> SessionToken {
    match steward.login(username, "pw").unwrap() {
        LoginOutcome::Authenticated { token } => token,
        other => panic!("expected single-role login, got {:?}", other),
    }
}

#[test]
fn full_lifecycle_from_creation_to_closure() {
    let f = facility();
    let manager_token = login_single(&f.steward, "mona");

    // the inspector holds two roles and must pick one
    let (provisional, available) = match f.steward.login("ida", "pw").unwrap() {
        LoginOutcome::RoleSelectionRequired {
            provisional_token,
            available_roles,
        } => (provisional_token, available_roles),
        other => panic!("expected role selection, got {:?}", other),
    };
    assert_eq!(available.len(), 2);
    let inspector_token = f
        .steward
        .select_role(&provisional, &f.inspector_role)
        .unwrap();

    let order = f
        .steward
        .create_work_order(
            &manager_token,
            CreateWorkOrderRequest {
                room: RoomId::new("r-101"),
                location: LocationId::new("hq"),
                cleaner: f.cleaner.clone(),
                inspector: f.inspector.clone(),
            },
        )
        .unwrap();
    assert_eq!(order.manager, f.manager);
    assert_eq!(order.items.len(), 3);

    // the cleaner sees the open order and logs a session against it
    let cleaner_token = login_single(&f.steward, "carl");
    let open = f.steward.cleaner_rooms(&cleaner_token).unwrap();
    assert_eq!(open.len(), 1);
    let start = Utc::now();
    f.steward
        .submit_cleaning_session(
            &cleaner_token,
            SubmitSessionRequest {
                work_order: order.id.clone(),
                room: order.room.clone(),
                start_time: start,
                stop_time: start + Duration::minutes(40),
            },
        )
        .unwrap();

    // staged approvals: two items, then the rest
    let ids: Vec<_> = order.items.iter().map(|i| i.id.clone()).collect();
    let first = f
        .steward
        .approve_items(&inspector_token, &order.id, &ids[..2])
        .unwrap();
    assert_eq!(first.outcome, CompletionOutcome::Incomplete);
    assert_eq!(first.pending.len(), 1);
    assert_eq!(
        f.steward
            .pending_items(&inspector_token, &order.id)
            .unwrap()
            .len(),
        1
    );

    let second = f
        .steward
        .approve_items(&inspector_token, &order.id, &ids[2..])
        .unwrap();
    assert_eq!(second.outcome, CompletionOutcome::Closed);
    assert!(second.pending.is_empty());
    assert!(f.steward.inspector_rooms(&inspector_token).unwrap().is_empty());

    // the pair stays occupied after closure
    let err = f
        .steward
        .create_work_order(
            &manager_token,
            CreateWorkOrderRequest {
                room: RoomId::new("r-101"),
                location: LocationId::new("hq"),
                cleaner: f.cleaner.clone(),
                inspector: f.inspector.clone(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    // histories read back through the reporting capability
    let room = f
        .steward
        .room_history(&manager_token, &RoomId::new("r-101"))
        .unwrap();
    assert!(room.work_order.map(|o| o.is_closed).unwrap_or(false));
    assert_eq!(room.sessions.len(), 1);

    let history = f
        .steward
        .cleaner_history(&manager_token, &f.cleaner)
        .unwrap();
    assert_eq!(history.work_orders.len(), 1);
    assert_eq!(history.sessions.len(), 1);
}

#[test]
fn provisional_token_cannot_authorize_operations() {
    let f = facility();
    let provisional = match f.steward.login("ida", "pw").unwrap() {
        LoginOutcome::RoleSelectionRequired {
            provisional_token, ..
        } => provisional_token,
        other => panic!("expected role selection, got {:?}", other),
    };

    let err = f.steward.inspector_rooms(&provisional).unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));
}

#[test]
fn selecting_an_unheld_role_is_rejected() {
    let f = facility();
    // mona holds only Manager; give her a second role so login goes
    // provisional, then ask for one she does not hold
    f.steward
        .roles()
        .assign_role(&f.manager, &f.cleaner_role)
        .unwrap();
    let provisional = match f.steward.login("mona", "pw").unwrap() {
        LoginOutcome::RoleSelectionRequired {
            provisional_token, ..
        } => provisional_token,
        other => panic!("expected role selection, got {:?}", other),
    };

    let err = f
        .steward
        .select_role(&provisional, &f.inspector_role)
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn capabilities_gate_every_surface() {
    let f = facility();
    let manager_token = login_single(&f.steward, "mona");
    let cleaner_token = login_single(&f.steward, "carl");

    let order = f
        .steward
        .create_work_order(
            &manager_token,
            CreateWorkOrderRequest {
                room: RoomId::new("r-101"),
                location: LocationId::new("hq"),
                cleaner: f.cleaner.clone(),
                inspector: f.inspector.clone(),
            },
        )
        .unwrap();

    // cleaners cannot approve, managers cannot approve, cleaners cannot
    // open orders or run the directory
    let err = f
        .steward
        .approve_items(&cleaner_token, &order.id, &[])
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));
    let err = f
        .steward
        .approve_items(&manager_token, &order.id, &[])
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));
    let err = f
        .steward
        .create_work_order(
            &cleaner_token,
            CreateWorkOrderRequest {
                room: RoomId::new("r-101"),
                location: LocationId::new("hq"),
                cleaner: f.cleaner.clone(),
                inspector: f.inspector.clone(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));
    let err = f
        .steward
        .staff_with_role(&manager_token, "Cleaner")
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));

    // a garbage token never gets past authentication
    let err = f
        .steward
        .all_work_orders(&SessionToken("not.a.token".to_string()))
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));
}

#[test]
fn admin_runs_the_directory_and_lists_staff() {
    let f = facility();
    let admin_token = login_single(&f.steward, "root");

    let staff = f.steward.staff_with_role(&admin_token, "Cleaner").unwrap();
    let mut names: Vec<_> = staff.iter().map(|s| s.username.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["carl", "ida"]);

    // deactivated staff drop out of the listing
    f.steward.deactivate_user(&admin_token, &f.cleaner).unwrap();
    let staff = f.steward.staff_with_role(&admin_token, "Cleaner").unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].user_id, f.inspector);

    // and a deactivated account can no longer log in
    let err = f.steward.login("carl", "pw").unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    // role lifecycle through the gated surface
    let auditor = f.steward.create_role(&admin_token, "Auditor").unwrap();
    f.steward
        .assign_role(&admin_token, &f.admin, &auditor.id)
        .unwrap();
    let removed = f
        .steward
        .remove_user_role(&admin_token, &f.admin, &auditor.id)
        .unwrap();
    assert_eq!(removed.removed, 1);
    f.steward.delete_role(&admin_token, &auditor.id).unwrap();
}
