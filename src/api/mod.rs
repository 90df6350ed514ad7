use rocket::Route;

mod catalog;
mod events;
mod participant;
mod recommendation;
mod session;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(catalog::routes());
    routes.extend(session::routes());
    routes.extend(participant::routes());
    routes.extend(recommendation::routes());
    routes.extend(events::routes());
    routes
}
