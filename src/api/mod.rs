use rocket::Route;

mod admin;
mod auth;
mod candidates;
mod results;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(auth::routes());
    routes.extend(candidates::routes());
    routes.extend(results::routes());
    routes.extend(voting::routes());
    routes
}
