//! Identity resolution against the directory sink.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{ClientContext, IdentityId, Submission};
use super::persistence::StoreError;

/// Length of the credential issued to auto-created identities.
pub const GENERATED_CREDENTIAL_LEN: usize = 12;

/// A stored identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub credential: String,
    pub created_at: DateTime<Utc>,
}

/// Directory of known identities, keyed by id and unique email.
pub trait IdentityDirectory: Send + Sync {
    fn fetch(&self, id: IdentityId) -> Result<Option<Identity>, StoreError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;
    /// Insert a new identity. Returns `Conflict` when the email is already
    /// claimed, which callers use to recover from concurrent creation.
    fn create(&self, identity: NewIdentity) -> Result<Identity, StoreError>;
    fn update(&self, identity: &Identity) -> Result<(), StoreError>;
}

/// How one submission mapped onto the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedIdentity {
    Existing(Identity),
    /// A fresh identity plus the one-time credential issued for it.
    Created {
        identity: Identity,
        credential: String,
    },
    Anonymous,
}

impl ResolvedIdentity {
    pub fn id(&self) -> Option<IdentityId> {
        match self {
            ResolvedIdentity::Existing(identity) => Some(identity.id),
            ResolvedIdentity::Created { identity, .. } => Some(identity.id),
            ResolvedIdentity::Anonymous => None,
        }
    }
}

/// Maps submissions to identities: session first, then email, then creation.
pub struct IdentityResolver {
    directory: Arc<dyn IdentityDirectory>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    pub fn resolve(
        &self,
        ctx: &ClientContext,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<ResolvedIdentity, StoreError> {
        if let Some(id) = ctx.session_identity {
            match self.directory.fetch(id)? {
                Some(identity) => {
                    let identity = self.reconcile(identity, submission);
                    return Ok(ResolvedIdentity::Existing(identity));
                }
                None => {
                    warn!(identity = id.0, "session identity not in directory, resolving by email");
                }
            }
        }

        let Some(email) = submission.contact.email.as_deref() else {
            return Ok(ResolvedIdentity::Anonymous);
        };

        if let Some(identity) = self.directory.find_by_email(email)? {
            return Ok(ResolvedIdentity::Existing(identity));
        }

        let credential = generate_credential();
        let new_identity = NewIdentity {
            email: email.to_string(),
            name: submission.contact.name.clone(),
            phone: submission.contact.phone.clone(),
            credential: credential.clone(),
            created_at: now,
        };
        match self.directory.create(new_identity) {
            Ok(identity) => Ok(ResolvedIdentity::Created {
                identity,
                credential,
            }),
            // Lost a concurrent create for the same email.
            Err(StoreError::Conflict) => match self.directory.find_by_email(email)? {
                Some(identity) => Ok(ResolvedIdentity::Existing(identity)),
                None => Err(StoreError::Conflict),
            },
            Err(error) => Err(error),
        }
    }

    /// Fold fresher contact details into a known identity. The email only
    /// moves when no other identity claims the submitted address; updates
    /// are best effort and never fail the submission.
    fn reconcile(&self, mut identity: Identity, submission: &Submission) -> Identity {
        let mut changed = false;

        if let Some(name) = &submission.contact.name {
            if identity.name.as_deref() != Some(name.as_str()) {
                identity.name = Some(name.clone());
                changed = true;
            }
        }
        if let Some(phone) = &submission.contact.phone {
            if identity.phone.as_deref() != Some(phone.as_str()) {
                identity.phone = Some(phone.clone());
                changed = true;
            }
        }
        if let Some(email) = &submission.contact.email {
            if identity.email != *email {
                match self.directory.find_by_email(email) {
                    Ok(Some(other)) if other.id != identity.id => {
                        warn!(
                            identity = identity.id.0,
                            claimed_by = other.id.0,
                            "submitted email already claimed, keeping the stored address"
                        );
                    }
                    Ok(_) => {
                        identity.email = email.clone();
                        changed = true;
                    }
                    Err(error) => {
                        warn!(%error, "email ownership check failed, keeping the stored address");
                    }
                }
            }
        }

        if changed {
            if let Err(error) = self.directory.update(&identity) {
                warn!(identity = identity.id.0, %error, "identity update failed");
            }
        }
        identity
    }
}

fn generate_credential() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_CREDENTIAL_LEN)
        .map(char::from)
        .collect()
}
