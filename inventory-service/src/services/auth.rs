use crate::models::user::normalize_email;
use crate::models::User;
use crate::services::database::MongoDb;
use crate::services::error::{is_duplicate_key, InventoryError};
use crate::services::jwt::{Claims, JwtService};
use crate::utils::{hash_password, verify_password, Password};
use mongodb::bson::doc;

#[derive(Clone)]
pub struct AuthService {
    db: MongoDb,
    jwt: JwtService,
}

/// A freshly issued session token and its user.
pub struct Session {
    pub token: String,
    pub user: User,
}

impl AuthService {
    pub fn new(db: MongoDb, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &Password,
    ) -> Result<Session, InventoryError> {
        let email = normalize_email(email);
        let users = self.db.users();

        if users.find_one(doc! { "email": &email }, None).await?.is_some() {
            return Err(InventoryError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(password)?;
        let user = User::new(name.trim().to_string(), &email, password_hash);

        users.insert_one(&user, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                InventoryError::EmailAlreadyRegistered
            } else {
                InventoryError::from(e)
            }
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.issue(user)
    }

    pub async fn signin(&self, email: &str, password: &Password) -> Result<Session, InventoryError> {
        let email = normalize_email(email);
        let user = self
            .db
            .users()
            .find_one(doc! { "email": &email }, None)
            .await?
            .ok_or(InventoryError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Sign-in with wrong password");
            return Err(InventoryError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User signed in");
        self.issue(user)
    }

    /// Loads the user a validated token was issued to.
    pub async fn resolve(&self, claims: &Claims) -> Result<User, InventoryError> {
        self.db
            .users()
            .find_one(doc! { "_id": &claims.sub }, None)
            .await?
            .ok_or(InventoryError::UnknownUser)
    }

    fn issue(&self, user: User) -> Result<Session, InventoryError> {
        let token = self.jwt.generate_token(&user.id, &user.email)?;
        Ok(Session { token, user })
    }
}
