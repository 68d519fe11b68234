use std::sync::Arc;

use tracing::warn;

use super::error::SyncError;
use super::storage::SyncStorage;
use super::types::ServerId;
use super::validation::normalize_guid;

const LOG_TARGET: &str = "progression::auth";

/// Trusted caller identity attached to a request once the gate passes.
#[derive(Clone, Debug)]
pub struct AuthedServer {
    pub server_id: ServerId,
    pub owner_name: String,
    pub server_guid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing required auth headers")]
    MissingCredentials,
    #[error("invalid API token")]
    InvalidToken,
    #[error("disabled API token")]
    TokenDisabled,
    #[error("API token not authorized for use with this server")]
    IdentityMismatch,
    #[error(transparent)]
    Storage(#[from] SyncError),
}

/// Validates a caller's secret token and claimed GUID against the registry.
///
/// Runs ahead of every round or progression operation. The check order
/// (missing headers, unknown token, disabled, mismatch) is chosen for
/// diagnosability; each check is independently sufficient to reject.
pub struct AuthGate {
    storage: Arc<dyn SyncStorage>,
}

impl AuthGate {
    pub fn new(storage: Arc<dyn SyncStorage>) -> Self {
        Self { storage }
    }

    pub async fn authenticate(
        &self,
        token: Option<&str>,
        claimed_guid: Option<&str>,
        peer_ip: &str,
    ) -> Result<AuthedServer, AuthError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let claimed_guid = claimed_guid.map(str::trim).filter(|g| !g.is_empty());
        let (Some(token), Some(claimed_guid)) = (token, claimed_guid) else {
            warn!(target: LOG_TARGET, ip = peer_ip, "rejected request without auth headers");
            return Err(AuthError::MissingCredentials);
        };
        let claimed_guid = normalize_guid(claimed_guid);

        // The token is the sole lookup key; the claimed GUID is only a
        // cross-check against replaying a stolen token under another name.
        let Some(server) = self.storage.find_server_by_token(token).await? else {
            warn!(target: LOG_TARGET, ip = peer_ip, "rejected request with unknown token");
            return Err(AuthError::InvalidToken);
        };
        if !server.authorized {
            warn!(
                target: LOG_TARGET,
                ip = peer_ip,
                owner = %server.owner_name,
                "rejected request with disabled token"
            );
            return Err(AuthError::TokenDisabled);
        }
        if server.server_guid != claimed_guid {
            warn!(
                target: LOG_TARGET,
                ip = peer_ip,
                claimed = %claimed_guid,
                owner = %server.owner_name,
                "rejected token presented for a different server"
            );
            return Err(AuthError::IdentityMismatch);
        }

        // Refresh the last-seen address when it drifts. Best-effort: a
        // failure here is logged and must never fail the request.
        if server.last_ip.as_deref() != Some(peer_ip) {
            if let Err(err) = self.storage.record_server_ip(server.id, peer_ip).await {
                warn!(
                    target: LOG_TARGET,
                    error = %err,
                    server_id = server.id,
                    "failed to refresh last-seen address"
                );
            }
        }

        Ok(AuthedServer {
            server_id: server.id,
            owner_name: server.owner_name,
            server_guid: server.server_guid,
        })
    }

    /// Bookkeeping behind the explicit auth-check endpoint; never fails the
    /// caller.
    pub async fn record_auth_check(&self, server_id: ServerId) {
        if let Err(err) = self.storage.record_auth_check(server_id).await {
            warn!(
                target: LOG_TARGET,
                error = %err,
                server_id,
                "failed to record auth check"
            );
        }
    }
}
