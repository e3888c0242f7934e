use serde::Serialize;
use serde_json::{Map, Value};

use crate::database::store::{to_record, Record};
use crate::error::ApiError;
use crate::types::Permission;

/// Which output view to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtoKind {
    User,
    Bill,
}

/// Fields never shown, and fields shown only from a minimum viewer permission
struct FieldPolicy {
    hidden: &'static [&'static str],
    gated: &'static [(&'static str, Permission)],
}

const USER_POLICY: FieldPolicy = FieldPolicy {
    hidden: &["password"],
    gated: &[("isDeleted", Permission::ADMIN)],
};

const BILL_POLICY: FieldPolicy = FieldPolicy {
    hidden: &[],
    gated: &[("userId", Permission::ADMIN)],
};

impl DtoKind {
    fn policy(self) -> &'static FieldPolicy {
        match self {
            DtoKind::User => &USER_POLICY,
            DtoKind::Bill => &BILL_POLICY,
        }
    }
}

/// Build the outward view of a stored record for a viewer.
///
/// Pure: the record is only read, and the same inputs always give the same view.
pub fn format_dto(kind: DtoKind, record: &Record, viewer: Permission) -> Value {
    let policy = kind.policy();

    let mut view = Map::new();
    for (key, value) in record {
        if policy.hidden.contains(&key.as_str()) {
            continue;
        }
        let gate = policy.gated.iter().find(|(field, _)| *field == key.as_str());
        if let Some((_, min)) = gate {
            if viewer < *min {
                continue;
            }
        }
        view.insert(key.clone(), value.clone());
    }
    Value::Object(view)
}

/// `format_dto` for a typed model
pub fn format_entity<T: Serialize>(kind: DtoKind, entity: &T, viewer: Permission) -> Result<Value, ApiError> {
    let record = to_record(entity)?;
    Ok(format_dto(kind, &record, viewer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        to_record(&value).unwrap()
    }

    #[test]
    fn user_password_is_never_exposed() {
        let user = record(json!({ "id": "u1", "name": "amy", "password": "pw", "permission": 10, "isDeleted": false }));

        for viewer in [Permission::USER, Permission::ADMIN, Permission(255)] {
            let view = format_dto(DtoKind::User, &user, viewer);
            assert!(view.get("password").is_none());
            assert_eq!(view["name"], "amy");
        }
    }

    #[test]
    fn gated_fields_follow_viewer_permission() {
        let user = record(json!({ "id": "u1", "name": "amy", "password": "pw", "isDeleted": false }));
        let bill = record(json!({ "id": "b1", "title": "lunch", "userId": "u1" }));

        assert!(format_dto(DtoKind::User, &user, Permission::USER).get("isDeleted").is_none());
        assert_eq!(format_dto(DtoKind::User, &user, Permission::ADMIN)["isDeleted"], false);

        assert!(format_dto(DtoKind::Bill, &bill, Permission(9)).get("userId").is_none());
        assert_eq!(format_dto(DtoKind::Bill, &bill, Permission::ADMIN)["userId"], "u1");
    }

    #[test]
    fn formatting_leaves_input_untouched() {
        let user = record(json!({ "id": "u1", "password": "pw" }));
        let before = user.clone();
        let _ = format_dto(DtoKind::User, &user, Permission::USER);
        assert_eq!(user, before);
    }
}
