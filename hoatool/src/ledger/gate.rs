use crate::ledger::store::AuthService;
use crate::ledger::LedgerError;
use crate::types::admins::AdminIdentity;

/// Re-authentication gate in front of every commit. The gate decides
/// nothing about what gets written; it only admits or refuses the
/// pending change-set.
pub struct CommitGate;

impl CommitGate {
    /// Re-proves the signed-in administrator's identity with the supplied
    /// password. Repeated failures keep returning `IncorrectPassword`
    /// without locking the account; rate limiting is the auth
    /// collaborator's concern, not ours.
    pub fn verify(
        auth: &impl AuthService,
        identity: &AdminIdentity,
        password: &str,
    ) -> Result<(), LedgerError> {
        match auth.reauthenticate(identity, password)? {
            true => Ok(()),
            false => Err(LedgerError::IncorrectPassword),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbConn;

    #[test]
    fn gate_admits_only_the_correct_password() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConn::new(dir.path().join("hoa.db")).unwrap();
        let uid = db
            .add_user(
                "Santos".to_string(),
                "santos@example.com".to_string(),
                "s3cret",
                true,
            )
            .unwrap();
        let identity = db.current_admin_identity(uid).unwrap();

        assert!(CommitGate::verify(&db, &identity, "s3cret").is_ok());
        assert!(matches!(
            CommitGate::verify(&db, &identity, "wrong"),
            Err(LedgerError::IncorrectPassword)
        ));
        // no lockout: the right password still works after failures
        assert!(CommitGate::verify(&db, &identity, "s3cret").is_ok());
    }
}
