//! Store-side authorization.
//!
//! [`OwnerRules`] is where "only approved owners may mutate their own
//! configuration" is enforced. Anything the admin surface disables is
//! advisory; these checks are not.

use std::fmt::Debug;

use serde_json::Value;

use super::{Actor, StoreError};
use crate::document::{DocumentKind, DocumentPath, OwnerId};

/// What a write policy gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub actor: &'a Actor,
    pub path: &'a DocumentPath,
    pub document: &'a Value,
    /// The document currently stored at `path`.
    pub existing: Option<&'a Value>,
    /// The writer's own profile (`users/{uid}`), when the actor is an owner.
    pub writer_profile: Option<&'a Value>,
}

pub trait AccessPolicy: Send + Sync + Debug {
    fn authorize_read(&self, actor: &Actor, path: &DocumentPath) -> Result<(), StoreError>;

    fn authorize_write(&self, request: &WriteRequest<'_>) -> Result<(), StoreError>;
}

/// Path of the profile a store must load to evaluate a write by `actor`.
pub fn writer_profile_path(actor: &Actor) -> Option<DocumentPath> {
    actor.owner().map(DocumentPath::profile)
}

/// No rules: every call is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

impl AccessPolicy for OpenAccess {
    fn authorize_read(&self, _actor: &Actor, _path: &DocumentPath) -> Result<(), StoreError> {
        Ok(())
    }

    fn authorize_write(&self, _request: &WriteRequest<'_>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Owner-scoped rules for the site collections.
///
/// - `users/{uid}`: readable by that owner; created once by that owner with
///   `isLogin == false`; never updated by the owner.
/// - `sites/{uid}`: public read; created by that owner when absent; updated
///   only while the owner's profile has `isLogin == true`.
/// - published pointers: public read; written by an approved owner naming
///   themselves.
/// - everything else: service only.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerRules;

fn is_approved(profile: Option<&Value>) -> bool {
    profile
        .and_then(|p| p.get("isLogin"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn require_owner<'a>(
    actor: &'a Actor,
    path: &DocumentPath,
    owner: &OwnerId,
) -> Result<&'a OwnerId, StoreError> {
    match actor.owner() {
        Some(uid) if uid == owner => Ok(uid),
        Some(_) => Err(StoreError::permission_denied(actor, path, "not the document owner")),
        None => Err(StoreError::permission_denied(actor, path, "authentication required")),
    }
}

impl AccessPolicy for OwnerRules {
    fn authorize_read(&self, actor: &Actor, path: &DocumentPath) -> Result<(), StoreError> {
        if *actor == Actor::Service {
            return Ok(());
        }
        match path.kind() {
            DocumentKind::Profile(owner) => require_owner(actor, path, &owner).map(|_| ()),
            DocumentKind::Site(_) | DocumentKind::PublicPointer | DocumentKind::PublicSettings => {
                Ok(())
            }
            DocumentKind::Other => Err(StoreError::permission_denied(
                actor,
                path,
                "restricted collection",
            )),
        }
    }

    fn authorize_write(&self, request: &WriteRequest<'_>) -> Result<(), StoreError> {
        let WriteRequest {
            actor,
            path,
            document,
            existing,
            writer_profile,
        } = *request;

        if *actor == Actor::Service {
            return Ok(());
        }
        let deny = |reason: &str| StoreError::permission_denied(actor, path, reason);

        match path.kind() {
            DocumentKind::Profile(owner) => {
                require_owner(actor, path, &owner)?;
                if existing.is_some() {
                    return Err(deny("profiles are managed by the approval process"));
                }
                if is_approved(Some(document)) {
                    return Err(deny("owners cannot approve themselves"));
                }
                Ok(())
            }
            DocumentKind::Site(owner) => {
                require_owner(actor, path, &owner)?;
                if existing.is_none() || is_approved(writer_profile) {
                    Ok(())
                } else {
                    Err(deny("account pending approval"))
                }
            }
            DocumentKind::PublicPointer | DocumentKind::PublicSettings => {
                let uid = actor.owner().ok_or_else(|| deny("authentication required"))?;
                if !is_approved(writer_profile) {
                    return Err(deny("account pending approval"));
                }
                let named = document.get("ownerUid").and_then(Value::as_str);
                if named != Some(uid.as_str()) {
                    return Err(deny("can only publish your own site"));
                }
                Ok(())
            }
            DocumentKind::Other => Err(deny("restricted collection")),
        }
    }
}
