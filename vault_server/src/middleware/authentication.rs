//! Access token middleware.
//!
//! Wrap any scope that needs an authenticated caller with this middleware. It reads the access token from the request
//! headers (see [`crate::auth`]), validates it, and stores the resulting [`AccessClaims`] in the request extensions,
//! where handlers and the [`super::AclMiddlewareFactory`] pick them up.
//!
//! Requests without a token, or with a bad or expired one, are rejected with a 401 before they reach the handler.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{extract_token, AccessClaims, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct AuthenticationMiddlewareFactory {
    issuer: Rc<TokenIssuer>,
}

impl AuthenticationMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        AuthenticationMiddlewareFactory { issuer: Rc::new(issuer) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AuthenticationMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService { issuer: Rc::clone(&self.issuer), service: Rc::new(service) }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    issuer: Rc<TokenIssuer>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let issuer = Rc::clone(&self.issuer);
        Box::pin(async move {
            let claims = authenticate(&issuer, &req).map_err(|e| {
                debug!("🔐️ Rejecting request to {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            trace!("🔐️ Authenticated {} as [{}]", claims.user_id, roles_list(&claims));
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn authenticate(issuer: &TokenIssuer, req: &ServiceRequest) -> Result<AccessClaims, AuthError> {
    let token = extract_token(req.headers()).ok_or(AuthError::MissingToken)?;
    issuer.validate(token)
}

fn roles_list(claims: &AccessClaims) -> String {
    claims.roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
}
