use crate::session::verify_token;
use crate::user::Profile;
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{error, web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// User data. Optional. None is an unauthenticated request.
    pub client: Option<Profile>,
    /// Time the request started for latency logging.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            client: None,
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    /// Resolves the request's Authorization header to an account.
    ///
    /// The token's signature and expiry are checked first, then the user
    /// row is re-read so a deleted account loses access immediately even
    /// with a still-valid token. Any failure along the way degrades to an
    /// unauthenticated context rather than an error; handlers decide what
    /// requires login.
    pub async fn from_bearer_token(db: &DatabaseConnection, header: Option<&str>) -> Self {
        let token = header.and_then(|value| value.strip_prefix("Bearer ").or(Some(value)));

        let client = match token.and_then(verify_token) {
            Some(claims) => match Profile::get_by_id(db, claims.sub).await {
                Ok(profile) => profile,
                Err(e) => {
                    log::error!("Failed to load user {} for bearer token: {}", claims.sub, e);
                    None
                }
            },
            None => None,
        };

        ClientCtxInner {
            client,
            ..Default::default()
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    /// Builds a context around an already resolved account. Used by the
    /// middleware, and handy for exercising authorization rules in tests.
    pub fn with_client(client: Option<Profile>) -> Self {
        Self(Data::new(ClientCtxInner {
            client,
            ..Default::default()
        }))
    }

    fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            // Existing record in extensions; pull it and return clone.
            Some(cbox) => Self(cbox.clone()),
            // No existing record; create and insert it.
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.client.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.0.client.as_ref().is_some_and(Profile::is_admin)
    }

    /// Require user to be logged in. Returns user_id or ErrorUnauthorized.
    pub fn require_login(&self) -> Result<i32, Error> {
        self.get_id()
            .ok_or_else(|| error::ErrorUnauthorized("Login required"))
    }

    /// Require an admin account. Returns the admin's user_id.
    /// Unauthenticated requests get 401; authenticated non-admins get 403.
    pub fn require_admin(&self) -> Result<i32, Error> {
        let user_id = self.require_login()?;
        if !self.is_admin() {
            return Err(error::ErrorForbidden("Administrator access required"));
        }
        Ok(user_id)
    }

    /// Check if user can modify content (owner or admin).
    pub fn can_modify(&self, resource_user_id: Option<i32>) -> bool {
        if self.is_admin() {
            return true;
        }

        if let (Some(user_id), Some(owner_id)) = (self.get_id(), resource_user_id) {
            return user_id == owner_id;
        }

        false
    }

    /// Require ownership of a resource. Returns () or ErrorForbidden.
    pub fn require_ownership(&self, resource_user_id: Option<i32>) -> Result<(), Error> {
        let user_id = self.require_login()?;

        match resource_user_id {
            Some(owner_id) if owner_id == user_id => Ok(()),
            _ => Err(error::ErrorForbidden("You don't own this resource")),
        }
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        Box::pin(async move {
            // Without a database handle there is no account to resolve;
            // the request proceeds unauthenticated.
            if let Some(db) = req.app_data::<Data<DatabaseConnection>>() {
                let auth_header = req
                    .headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned);

                let inner =
                    ClientCtxInner::from_bearer_token(db.get_ref(), auth_header.as_deref()).await;
                req.extensions_mut().insert(Data::new(inner));
            }

            svc.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::users::Role;

    fn profile(id: i32, role: Role) -> Profile {
        Profile {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            role,
            bio: None,
            avatar_url: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn guest_cannot_do_anything_gated() {
        let ctx = ClientCtx::default();
        assert!(!ctx.is_user());
        assert!(ctx.require_login().is_err());
        assert!(ctx.require_admin().is_err());
        assert!(!ctx.can_modify(Some(1)));
    }

    #[test]
    fn owner_can_modify_own_resource_only() {
        let ctx = ClientCtx::with_client(Some(profile(1, Role::User)));
        assert_eq!(ctx.require_login().unwrap(), 1);
        assert!(ctx.require_admin().is_err());
        assert!(ctx.can_modify(Some(1)));
        assert!(!ctx.can_modify(Some(2)));
        assert!(!ctx.can_modify(None));
        assert!(ctx.require_ownership(Some(1)).is_ok());
        assert!(ctx.require_ownership(Some(2)).is_err());
    }

    #[test]
    fn admin_can_modify_everything() {
        let ctx = ClientCtx::with_client(Some(profile(9, Role::Admin)));
        assert_eq!(ctx.require_admin().unwrap(), 9);
        assert!(ctx.can_modify(Some(1)));
        assert!(ctx.can_modify(None));
        // Admin privileges do not imply ownership.
        assert!(ctx.require_ownership(Some(1)).is_err());
    }
}
