//! Generic CRUD routes, instantiated per resource from a permission table.
//!
//! A route is mounted only when the table names a permission for it, and
//! each searchable field gets its own static route so every search has a
//! fixed permission.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    response::Response,
    routing::{MethodRouter, delete, get, post, put},
    Router,
};
use serde::Serialize;
use serde_json::json;

use totes_auth::PermissionId;
use totes_core::Entity;
use totes_infra::{CrudService, Services};

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, PathParam, execute, json_body};
use crate::context::RequestContext;

#[derive(Debug, Clone, Copy)]
pub struct CrudPermissions {
    pub list: Option<PermissionId>,
    pub get: Option<PermissionId>,
    /// `(field, permission)` per searchable field.
    pub search: &'static [(&'static str, PermissionId)],
    pub create: Option<PermissionId>,
    pub update: Option<PermissionId>,
    pub delete: Option<PermissionId>,
}

impl CrudPermissions {
    pub const NONE: CrudPermissions = CrudPermissions {
        list: None,
        get: None,
        search: &[],
        create: None,
        update: None,
        delete: None,
    };
}

pub trait Resource: Send + Sync + 'static {
    type Entity: Entity;
    /// What clients see; lets a resource hide stored fields.
    type View: Serialize + Send + 'static;

    /// Singular label for messages, e.g. "customer".
    const LABEL: &'static str;
    const PERMISSIONS: CrudPermissions;

    fn service(services: &Services) -> &CrudService<Self::Entity>;

    fn view(entity: Self::Entity) -> Self::View;
}

/// Routes of one resource, open for resource-specific additions before
/// [`CrudRouter::build`].
pub struct CrudRouter {
    collection: Option<MethodRouter>,
    member: Option<MethodRouter>,
    router: Router,
}

impl CrudRouter {
    /// Add methods on the collection path (`/`).
    pub fn collection(mut self, methods: MethodRouter) -> Self {
        self.collection = Some(merge(self.collection, methods));
        self
    }

    /// Add methods on the member path (`/:id`).
    pub fn member(mut self, methods: MethodRouter) -> Self {
        self.member = Some(merge(self.member, methods));
        self
    }

    pub fn route(mut self, path: &str, methods: MethodRouter) -> Self {
        self.router = self.router.route(path, methods);
        self
    }

    pub fn build(self) -> Router {
        let mut router = self.router;
        if let Some(methods) = self.collection {
            router = router.route("/", methods);
        }
        if let Some(methods) = self.member {
            router = router.route("/:id", methods);
        }
        router
    }
}

fn merge(existing: Option<MethodRouter>, next: MethodRouter) -> MethodRouter {
    match existing {
        Some(methods) => methods.merge(next),
        None => next,
    }
}

pub fn routes<R: Resource>() -> CrudRouter {
    let p = R::PERMISSIONS;
    let mut crud = CrudRouter { collection: None, member: None, router: Router::new() };

    if let Some(perm) = p.list {
        let handler = move |app: Extension<AppState>, ctx: Extension<RequestContext>| list::<R>(app, ctx, perm);
        crud = crud.collection(get(handler));
    }
    if let Some(perm) = p.create {
        let handler =
            move |app: Extension<AppState>, ctx: Extension<RequestContext>, body: Bytes| create::<R>(app, ctx, perm, body);
        crud = crud.collection(post(handler));
    }
    if let Some(perm) = p.get {
        let handler = move |app: Extension<AppState>, ctx: Extension<RequestContext>, id: PathParam| {
            get_one::<R>(app, ctx, id, perm)
        };
        crud = crud.member(get(handler));
    }
    if let Some(perm) = p.update {
        let handler =
            move |app: Extension<AppState>, ctx: Extension<RequestContext>, id: PathParam, body: Bytes| {
                update::<R>(app, ctx, id, perm, body)
            };
        crud = crud.member(put(handler));
    }
    if let Some(perm) = p.delete {
        let handler = move |app: Extension<AppState>, ctx: Extension<RequestContext>, id: PathParam| {
            remove::<R>(app, ctx, id, perm)
        };
        crud = crud.member(delete(handler));
    }

    for &(field, perm) in p.search {
        let handler =
            move |app: Extension<AppState>, ctx: Extension<RequestContext>, query: Query<HashMap<String, String>>| {
                search::<R>(app, ctx, query, field, perm)
            };
        crud = crud.route(&format!("/search/{field}"), get(handler));
    }

    crud
}

/// Plain CRUD router for resources without extra routes.
pub fn router<R: Resource>() -> Router {
    routes::<R>().build()
}

async fn list<R: Resource>(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    permission: PermissionId,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("list {}s", R::LABEL), permission);
    execute(app, &ctx, op, || Ok(()), |()| async move {
        let all = R::service(&app.services).list().await.for_entity(R::LABEL)?;
        Ok(all.into_iter().map(R::view).collect::<Vec<_>>())
    })
    .await
}

async fn get_one<R: Resource>(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    permission: PermissionId,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("get {} {raw}", R::LABEL), permission);
    execute(app, &ctx, op, || raw.id(), |id| async move {
        let entity = R::service(&app.services).get(id).await.for_entity(R::LABEL)?;
        Ok(R::view(entity))
    })
    .await
}

async fn search<R: Resource>(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<HashMap<String, String>>,
    field: &'static str,
    permission: PermissionId,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("search {}s by {field}", R::LABEL), permission);
    let bind = || match params.get("q").map(|q| q.trim()) {
        Some(q) if !q.is_empty() => Ok(q.to_string()),
        _ => Err(ApiError::bad_request("query parameter 'q' is required")),
    };
    execute(app, &ctx, op, bind, |needle| async move {
        let found = R::service(&app.services).search(field, &needle).await.for_entity(R::LABEL)?;
        if found.is_empty() {
            return Err(ApiError::NotFound(format!("no {}s found", R::LABEL)));
        }
        Ok(found.into_iter().map(R::view).collect::<Vec<_>>())
    })
    .await
}

async fn create<R: Resource>(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    permission: PermissionId,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("create {}", R::LABEL), permission).created();
    execute(app, &ctx, op, || json_body::<R::Entity>(&body), |entity| async move {
        let created = R::service(&app.services).create(entity).await.for_entity(R::LABEL)?;
        Ok(R::view(created))
    })
    .await
}

async fn update<R: Resource>(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    permission: PermissionId,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("update {} {raw}", R::LABEL), permission);
    let bind = || -> Result<_, ApiError> { Ok((raw.id()?, json_body::<R::Entity>(&body)?)) };
    execute(app, &ctx, op, bind, |(id, entity)| async move {
        let updated = R::service(&app.services).update(id, entity).await.for_entity(R::LABEL)?;
        Ok(R::view(updated))
    })
    .await
}

async fn remove<R: Resource>(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    permission: PermissionId,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("delete {} {raw}", R::LABEL), permission);
    execute(app, &ctx, op, || raw.id(), |id| async move {
        R::service(&app.services).delete(id).await.for_entity(R::LABEL)?;
        Ok(json!({ "message": format!("{} {id} deleted", R::LABEL) }))
    })
    .await
}
