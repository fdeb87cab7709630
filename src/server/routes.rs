use axum::routing::{get, patch, post};
use axum::Router;

use super::handlers::{
    self, activity, auth, followups, intake, leads, people, reports, tags, workflows,
};
use super::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // auth
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        // leads and comments
        .route("/leads", get(leads::list).post(leads::create))
        .route(
            "/leads/:id",
            get(leads::get).patch(leads::update).delete(leads::delete),
        )
        .route("/leads/convert/:submission_id", post(leads::convert))
        .route("/comments", post(leads::add_comment))
        .route("/comments/:lead_id", get(leads::comments))
        // website intake
        .route("/submissions", get(intake::list).post(intake::submit))
        .route("/submissions/filter", post(intake::filter))
        .route(
            "/submissions/:id",
            get(intake::get)
                .patch(intake::set_status)
                .delete(intake::delete),
        )
        .route("/form-submissions", get(intake::form_submissions))
        .route("/form-submissions/:form_type", get(intake::form_submissions_of))
        .route(
            "/newsletter",
            get(intake::newsletter).post(intake::add_newsletter),
        )
        .route("/newsletter/:id", patch(intake::toggle_newsletter))
        .route("/forms/fields", post(intake::add_form_field))
        .route("/forms/:form_type/fields", get(intake::form_fields))
        // users and roles
        .route(
            "/users",
            get(people::list_users).post(people::create_user),
        )
        .route("/users/assignable", get(people::assignable))
        .route("/users/hierarchy", get(people::hierarchy))
        .route(
            "/users/:id",
            patch(people::update_user).delete(people::delete_user),
        )
        .route(
            "/roles",
            get(people::list_roles).post(people::create_role),
        )
        .route(
            "/roles/:id",
            patch(people::update_role).delete(people::delete_role),
        )
        // tags
        .route("/tags", get(tags::list).post(tags::create))
        .route("/tags/:id", patch(tags::update).delete(tags::delete))
        .route(
            "/tags/entity/:entity_type/:entity_id",
            get(tags::entity_tags).post(tags::tag_entity),
        )
        .route(
            "/tags/entity/:entity_type/:entity_id/:tag_id",
            axum::routing::delete(tags::untag_entity),
        )
        // follow-ups
        .route(
            "/reminders",
            get(followups::list_reminders).post(followups::create_reminder),
        )
        .route("/reminders/my/upcoming", get(followups::my_upcoming))
        .route(
            "/reminders/:id",
            get(followups::get_reminder)
                .patch(followups::update_reminder)
                .delete(followups::delete_reminder),
        )
        .route(
            "/call-logs",
            get(followups::list_call_logs).post(followups::create_call_log),
        )
        .route(
            "/call-logs/:id",
            get(followups::get_call_log)
                .patch(followups::update_call_log)
                .delete(followups::delete_call_log),
        )
        // activity
        .route("/activities", get(activity::list))
        .route("/activities/recent", get(activity::recent))
        .route("/activities/lead/:id", get(activity::for_lead))
        .route("/activities/user/:id", get(activity::for_user))
        // reports
        .route("/reports/team", get(reports::team))
        .route("/reports/org", get(reports::org))
        // workflows
        .route("/workflows/demo-request", post(workflows::demo_request))
        .route(
            "/workflows/brochure-download",
            post(workflows::brochure_download),
        )
        .route(
            "/workflows/newsletter-signup",
            post(workflows::newsletter_signup),
        )
        .route("/workflows/inactive-lead", post(workflows::inactive_lead))
        .route(
            "/workflows/process-inactive-leads",
            post(workflows::process_inactive_leads),
        )
        .with_state(state)
}
