/// Identity orchestration
///
/// Composes the credential policy, hasher, OTP manager, session signer,
/// and email transport against the external user store. This is the only
/// component that touches the user store; token and OTP handling stay
/// persistence-free.
use crate::db::{NewUser, UserStore};
use crate::error::{AuthError, Result};
use crate::models::User;
use crate::security::{PasswordHasher, SessionSigner};
use crate::services::email::{mask_email, EmailService};
use crate::services::oauth::FederatedProfile;
use crate::services::otp::OtpService;
use crate::validators;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    signer: Arc<SessionSigner>,
    otp: OtpService,
    mailer: EmailService,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        signer: Arc<SessionSigner>,
        otp: OtpService,
        mailer: EmailService,
    ) -> Self {
        Self {
            store,
            hasher,
            signer,
            otp,
            mailer,
        }
    }

    /// Create a new identity from name, email, and password.
    ///
    /// Validation order: blank check, email syntax, uniqueness, then the
    /// password rules one at a time so each failure names its rule.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "name, email, and password cannot be blank".to_string(),
            ));
        }

        if !validators::is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let strength = validators::check_password_strength(password);
        if !strength.meets_min_length {
            return Err(AuthError::WeakPassword(
                "password must be at least 8 characters long".to_string(),
            ));
        }
        if !strength.has_letter {
            return Err(AuthError::WeakPassword(
                "password must contain at least one letter".to_string(),
            ));
        }
        if !strength.has_digit {
            return Err(AuthError::WeakPassword(
                "password must contain at least one number".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(password)?;

        let user = self
            .store
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: Some(password_hash),
            })
            .await?;

        info!(user_id = %user.id, email = %mask_email(&user.email), "user registered");
        Ok(user)
    }

    /// Authenticate with email and password; issue a session token.
    ///
    /// Unknown email and wrong password both surface as
    /// `InvalidCredentials` so the response does not reveal which factor
    /// failed; the distinction survives only in trace logs.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "email and password cannot be blank".to_string(),
            ));
        }

        let Some(user) = self.store.find_by_email(email).await? else {
            debug!(email = %mask_email(email), "login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        // Identities created through OAuth carry no hash and fail closed.
        let verified = user
            .password_hash
            .as_deref()
            .map(|hash| self.hasher.verify(hash, password))
            .unwrap_or(false);
        if !verified {
            debug!(user_id = %user.id, "login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .signer
            .issue(&user.id.to_string(), &user.name, &user.email)?;

        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Issue a session token for a federated identity.
    ///
    /// The identity is upserted first: an existing account with the
    /// profile's email is reused, otherwise a passwordless account is
    /// created. The token always names a real stored subject.
    pub async fn oauth_login(&self, profile: FederatedProfile) -> Result<String> {
        let user = match self.store.find_by_email(&profile.email).await? {
            Some(existing) => existing,
            None => {
                let user = self
                    .store
                    .create(NewUser {
                        name: profile.name.clone(),
                        email: profile.email.clone(),
                        password_hash: None,
                    })
                    .await?;

                info!(user_id = %user.id, "new user created via OAuth");
                user
            }
        };

        let token = self
            .signer
            .issue(&user.id.to_string(), &user.name, &user.email)?;

        info!(user_id = %user.id, "user logged in via OAuth");
        Ok(token)
    }

    /// Generate a one-time code for `email` and dispatch it by mail.
    pub async fn send_otp(&self, email: &str) -> Result<()> {
        if !validators::is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        let code = self.otp.issue_code(email).await?;
        self.mailer.send_otp_email(email, &code).await?;

        info!(email = %mask_email(email), "OTP sent");
        Ok(())
    }

    /// Validate a one-time code and stamp the identity's email as verified.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<User> {
        if !self.otp.validate_code(email, code).await? {
            return Err(AuthError::InvalidOtp);
        }

        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.email_verified_at = Some(Utc::now());
        let user = self.store.update(&user).await?;

        info!(user_id = %user.id, "email verified");
        Ok(user)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        self.store.list_all().await
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        self.store.find_by_id(id).await?.ok_or(AuthError::UserNotFound)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Partial update: only non-blank fields overwrite stored values; an
    /// email change is re-validated for syntax and uniqueness against
    /// other users.
    pub async fn update_user(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        let mut user = self.get_user_by_id(id).await?;

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        if name.is_none() && email.is_none() {
            return Err(AuthError::Validation(
                "name and email cannot both be blank".to_string(),
            ));
        }

        if let Some(name) = name {
            user.name = name.to_string();
        }

        if let Some(email) = email {
            if !validators::is_valid_email(email) {
                return Err(AuthError::InvalidEmail);
            }
            if let Some(existing) = self.store.find_by_email(email).await? {
                if existing.id != user.id {
                    return Err(AuthError::EmailInUse);
                }
            }
            user.email = email.to_string();
        }

        self.store.update(&user).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<User> {
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmailSettings, HasherSettings};
    use crate::models::Role;
    use crate::services::otp::{OtpStore, DEFAULT_OTP_TTL};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    /// In-memory user store mirroring the Postgres contract.
    #[derive(Default)]
    struct MemoryUserStore {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }

        async fn create(&self, new: NewUser) -> Result<User> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == new.email) {
                return Err(AuthError::EmailAlreadyExists);
            }
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                password_hash: new.password_hash,
                role: Role::User,
                email_verified_at: None,
                created_at: now,
                updated_at: now,
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> Result<User> {
            let mut users = self.users.lock().unwrap();
            let slot = users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(AuthError::UserNotFound)?;
            *slot = user.clone();
            slot.updated_at = Utc::now();
            Ok(slot.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<User> {
            let mut users = self.users.lock().unwrap();
            let position = users
                .iter()
                .position(|u| u.id == id)
                .ok_or(AuthError::UserNotFound)?;
            Ok(users.remove(position))
        }

        async fn list_all(&self) -> Result<Vec<User>> {
            Ok(self.users.lock().unwrap().clone())
        }
    }

    /// In-memory OTP store without expiry (tests use fresh codes).
    #[derive(Default)]
    struct MemoryOtpStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl OtpStore for MemoryOtpStore {
        async fn set(&self, key: &str, value: &str, _ttl: StdDuration) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn signer() -> Arc<SessionSigner> {
        Arc::new(SessionSigner::new(b"unit-test-secret", Duration::hours(24)))
    }

    fn service() -> UserService {
        let hasher = PasswordHasher::new(&HasherSettings {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("test parameters are valid");

        let mailer = EmailService::new(&EmailSettings {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@refina.dev".to_string(),
            use_starttls: true,
        })
        .expect("no-op mailer builds");

        UserService::new(
            Arc::new(MemoryUserStore::default()),
            hasher,
            signer(),
            OtpService::new(Arc::new(MemoryOtpStore::default()), DEFAULT_OTP_TTL),
            mailer,
        )
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let service = service();
        let err = service.register("", "ann@x.com", "pass1234").await;
        assert!(matches!(err, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let service = service();
        let err = service.register("Ann", "not-an-email", "pass1234").await;
        assert!(matches!(err, Err(AuthError::InvalidEmail)));
    }

    #[tokio::test]
    async fn test_register_reports_each_password_rule() {
        let service = service();

        let err = service.register("Ann", "ann@x.com", "a1").await;
        match err {
            Err(AuthError::WeakPassword(msg)) => assert!(msg.contains("8 characters")),
            other => panic!("expected WeakPassword, got {other:?}"),
        }

        let err = service.register("Ann", "ann@x.com", "12345678").await;
        match err {
            Err(AuthError::WeakPassword(msg)) => assert!(msg.contains("letter")),
            other => panic!("expected WeakPassword, got {other:?}"),
        }

        let err = service.register("Ann", "ann@x.com", "passwords").await;
        match err {
            Err(AuthError::WeakPassword(msg)) => assert!(msg.contains("number")),
            other => panic!("expected WeakPassword, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_then_duplicate_conflicts() {
        let service = service();
        service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let err = service.register("Ann", "ann@x.com", "pass1234").await;
        assert!(matches!(err, Err(AuthError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let service = service();
        let user = service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let hash = user.password_hash.expect("hash is stored");
        assert_ne!(hash, "pass1234");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_login_round_trips_through_token() {
        let service = service();
        let user = service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let token = service.login("ann@x.com", "pass1234").await.unwrap();
        let claims = signer().verify(&token).expect("token verifies");
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.name, "Ann");
        assert_eq!(claims.email, "ann@x.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_identical() {
        let service = service();
        service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let wrong = service.login("ann@x.com", "wrong").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let unknown = service.login("bob@x.com", "pass1234").await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_oauth_login_creates_identity_on_first_sight() {
        let service = service();
        let token = service
            .oauth_login(FederatedProfile {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
            })
            .await
            .unwrap();

        let user = service.get_user_by_email("ann@x.com").await.unwrap();
        assert!(user.password_hash.is_none());

        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn test_oauth_login_reuses_existing_identity() {
        let service = service();
        let registered = service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let token = service
            .oauth_login(FederatedProfile {
                name: "Ann from Google".to_string(),
                email: "ann@x.com".to_string(),
            })
            .await
            .unwrap();

        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.sub, registered.id.to_string());
        assert_eq!(service.get_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_passwordless_oauth_identity_cannot_password_login() {
        let service = service();
        service
            .oauth_login(FederatedProfile {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
            })
            .await
            .unwrap();

        let err = service.login("ann@x.com", "pass1234").await;
        assert!(matches!(err, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_send_then_verify_otp_stamps_verification() {
        let service = service();
        service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        service.send_otp("ann@x.com").await.unwrap();

        // The mailed code is opaque to the test; re-issuing overwrites it
        // with one we hold, which is itself the contract under test.
        let live = service.otp.issue_code("ann@x.com").await.unwrap();
        let user = service.verify_otp("ann@x.com", &live).await.unwrap();
        assert!(user.is_email_verified());
    }

    #[tokio::test]
    async fn test_verify_otp_with_wrong_code_fails() {
        let service = service();
        service.register("Ann", "ann@x.com", "pass1234").await.unwrap();
        let live = service.otp.issue_code("ann@x.com").await.unwrap();

        let wrong = if live == "000000" { "000001" } else { "000000" };
        let err = service.verify_otp("ann@x.com", wrong).await;
        assert!(matches!(err, Err(AuthError::InvalidOtp)));

        // The pending code is untouched and still verifies.
        let user = service.verify_otp("ann@x.com", &live).await.unwrap();
        assert!(user.is_email_verified());
    }

    #[tokio::test]
    async fn test_verify_otp_without_pending_code_fails() {
        let service = service();
        service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let err = service.verify_otp("ann@x.com", "123456").await;
        assert!(matches!(err, Err(AuthError::InvalidOtp)));
    }

    #[tokio::test]
    async fn test_update_user_partial_semantics() {
        let service = service();
        let user = service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        // Blank email leaves the stored address untouched.
        let updated = service
            .update_user(user.id, Some("Ann Lee"), Some(""))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ann Lee");
        assert_eq!(updated.email, "ann@x.com");

        // Both blank is an error.
        let err = service.update_user(user.id, Some("  "), None).await;
        assert!(matches!(err, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_email() {
        let service = service();
        let ann = service.register("Ann", "ann@x.com", "pass1234").await.unwrap();
        service.register("Bob", "bob@x.com", "pass1234").await.unwrap();

        let err = service.update_user(ann.id, None, Some("bob@x.com")).await;
        assert!(matches!(err, Err(AuthError::EmailInUse)));

        // Re-submitting your own email is not a conflict.
        let ok = service.update_user(ann.id, None, Some("ann@x.com")).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_returns_the_deleted_row() {
        let service = service();
        let user = service.register("Ann", "ann@x.com", "pass1234").await.unwrap();

        let deleted = service.delete_user(user.id).await.unwrap();
        assert_eq!(deleted.id, user.id);

        let err = service.get_user_by_id(user.id).await;
        assert!(matches!(err, Err(AuthError::UserNotFound)));
    }
}
