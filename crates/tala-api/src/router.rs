// ============================================================================
// Tala API - Router
// File: crates/tala-api/src/router.rs
// ============================================================================
//! Route table and middleware layering for the HTTP surface

use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::handlers;
use crate::middleware::{audit, auth, rate_limit, tenant};
use crate::middleware::rate_limit::RateLimit;
use crate::state::AppState;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const AUTH_REQUESTS_PER_MINUTE: u32 = 30;
const WEBHOOK_REQUESTS_PER_MINUTE: u32 = 120;

pub fn build_router(state: AppState) -> Router {
    // Public routes (no token, no tenant)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/api/v1/billing/plans", get(handlers::billing::list_plans))
        .route(
            "/api/v1/billing/plans/{id}",
            get(handlers::billing::get_plan),
        )
        .route(
            "/api/v1/assessments/take/{token}",
            get(handlers::assessments::take),
        )
        .route(
            "/api/v1/assessments/take/{token}/responses",
            post(handlers::assessments::submit_responses),
        );

    // Credential endpoints get a per-IP budget against stuffing
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/v1/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .layer(middleware::from_fn_with_state(
            RateLimit::per_minute(AUTH_REQUESTS_PER_MINUTE),
            rate_limit::enforce,
        ));

    // Provider webhooks authenticate by signature, not token
    let webhook_routes = Router::new()
        .route("/webhooks/stripe", post(handlers::webhooks::stripe))
        .route("/webhooks/paypal", post(handlers::webhooks::paypal))
        .layer(middleware::from_fn_with_state(
            RateLimit::per_minute(WEBHOOK_REQUESTS_PER_MINUTE),
            rate_limit::enforce,
        ));

    // Everything below requires a valid access token; tenant resolution
    // and the audit trail ride on the same stack.
    let protected_routes = Router::new()
        // Auth/session
        .route("/api/v1/auth/me", get(handlers::auth::me))
        // Organizations and membership
        .route(
            "/api/v1/organizations",
            post(handlers::organizations::create_organization),
        )
        .route(
            "/api/v1/organizations/current",
            get(handlers::organizations::current_organization)
                .put(handlers::organizations::update_organization),
        )
        .route(
            "/api/v1/organizations/memberships",
            get(handlers::organizations::my_memberships),
        )
        .route(
            "/api/v1/organizations/memberships/{id}/primary",
            put(handlers::organizations::set_primary_membership),
        )
        .route(
            "/api/v1/organizations/members",
            get(handlers::organizations::list_members),
        )
        .route(
            "/api/v1/organizations/members/{id}/role",
            put(handlers::organizations::change_member_role),
        )
        .route(
            "/api/v1/organizations/members/{id}",
            delete(handlers::organizations::remove_member),
        )
        .route(
            "/api/v1/organizations/invites",
            post(handlers::organizations::invite_member)
                .get(handlers::organizations::pending_invites),
        )
        .route(
            "/api/v1/organizations/invites/accept",
            post(handlers::organizations::accept_invite),
        )
        // Workforce
        .route(
            "/api/v1/workforce/departments",
            post(handlers::workforce::create_department).get(handlers::workforce::list_departments),
        )
        .route(
            "/api/v1/workforce/departments/{id}",
            get(handlers::workforce::get_department).put(handlers::workforce::update_department),
        )
        .route(
            "/api/v1/workforce/departments/{id}/manager",
            put(handlers::workforce::assign_department_manager),
        )
        .route(
            "/api/v1/workforce/positions",
            post(handlers::workforce::create_position).get(handlers::workforce::list_positions),
        )
        .route(
            "/api/v1/workforce/positions/{id}",
            get(handlers::workforce::get_position).put(handlers::workforce::update_position),
        )
        .route(
            "/api/v1/workforce/employees",
            post(handlers::workforce::create_employee).get(handlers::workforce::list_employees),
        )
        .route(
            "/api/v1/workforce/employees/{id}",
            get(handlers::workforce::get_employee).put(handlers::workforce::update_employee),
        )
        .route(
            "/api/v1/workforce/employees/{id}/terminate",
            post(handlers::workforce::terminate_employee),
        )
        // Assessments
        .route(
            "/api/v1/assessments",
            post(handlers::assessments::create_assessment)
                .get(handlers::assessments::list_assessments),
        )
        .route(
            "/api/v1/assessments/instances",
            get(handlers::assessments::list_instances),
        )
        .route(
            "/api/v1/assessments/instances/{id}",
            get(handlers::assessments::get_instance),
        )
        .route(
            "/api/v1/assessments/instances/{id}/cancel",
            post(handlers::assessments::cancel_instance),
        )
        .route(
            "/api/v1/assessments/instances/{id}/results",
            get(handlers::assessments::instance_results),
        )
        .route(
            "/api/v1/assessments/{id}",
            get(handlers::assessments::get_assessment)
                .put(handlers::assessments::update_assessment)
                .delete(handlers::assessments::delete_assessment),
        )
        .route(
            "/api/v1/assessments/{id}/activate",
            post(handlers::assessments::activate_assessment),
        )
        .route(
            "/api/v1/assessments/{id}/archive",
            post(handlers::assessments::archive_assessment),
        )
        .route(
            "/api/v1/assessments/{id}/questions",
            post(handlers::assessments::add_question).get(handlers::assessments::list_questions),
        )
        .route(
            "/api/v1/assessments/{id}/questions/{question_id}",
            put(handlers::assessments::update_question),
        )
        .route(
            "/api/v1/assessments/{id}/questions/{question_id}/options",
            post(handlers::assessments::add_option),
        )
        .route(
            "/api/v1/assessments/{id}/invite",
            post(handlers::assessments::invite),
        )
        // Development plans
        .route(
            "/api/v1/pdi/plans",
            post(handlers::pdi::create_plan).get(handlers::pdi::list_plans),
        )
        .route(
            "/api/v1/pdi/plans/{id}",
            get(handlers::pdi::get_plan).put(handlers::pdi::update_plan),
        )
        .route("/api/v1/pdi/plans/{id}/submit", post(handlers::pdi::submit_plan))
        .route(
            "/api/v1/pdi/plans/{id}/approve",
            post(handlers::pdi::approve_plan),
        )
        .route(
            "/api/v1/pdi/plans/{id}/complete",
            post(handlers::pdi::complete_plan),
        )
        .route(
            "/api/v1/pdi/plans/{id}/cancel",
            post(handlers::pdi::cancel_plan),
        )
        .route(
            "/api/v1/pdi/plans/{id}/tasks",
            post(handlers::pdi::add_task).get(handlers::pdi::list_tasks),
        )
        .route(
            "/api/v1/pdi/plans/{id}/tasks/{task_id}",
            put(handlers::pdi::update_task),
        )
        .route(
            "/api/v1/pdi/plans/{id}/tasks/{task_id}/progress",
            post(handlers::pdi::update_task_progress),
        )
        .route(
            "/api/v1/pdi/plans/{id}/tasks/{task_id}/history",
            get(handlers::pdi::task_history),
        )
        .route(
            "/api/v1/pdi/templates",
            post(handlers::pdi::create_template).get(handlers::pdi::list_templates),
        )
        .route(
            "/api/v1/pdi/templates/{id}",
            get(handlers::pdi::get_template).put(handlers::pdi::update_template),
        )
        .route("/api/v1/pdi/generate", post(handlers::pdi::generate_plan))
        // Recruiting
        .route(
            "/api/v1/recruiting/clients",
            post(handlers::recruiting::create_client).get(handlers::recruiting::list_clients),
        )
        .route(
            "/api/v1/recruiting/clients/{id}",
            get(handlers::recruiting::get_client)
                .put(handlers::recruiting::update_client)
                .delete(handlers::recruiting::delete_client),
        )
        .route(
            "/api/v1/recruiting/jobs",
            post(handlers::recruiting::create_job).get(handlers::recruiting::list_jobs),
        )
        .route(
            "/api/v1/recruiting/jobs/{id}",
            get(handlers::recruiting::get_job).put(handlers::recruiting::update_job),
        )
        .route(
            "/api/v1/recruiting/jobs/{id}/open",
            post(handlers::recruiting::open_job),
        )
        .route(
            "/api/v1/recruiting/jobs/{id}/applications",
            get(handlers::recruiting::list_applications),
        )
        .route(
            "/api/v1/recruiting/candidates",
            post(handlers::recruiting::create_candidate)
                .get(handlers::recruiting::list_candidates),
        )
        .route(
            "/api/v1/recruiting/candidates/{id}",
            get(handlers::recruiting::get_candidate)
                .put(handlers::recruiting::update_candidate)
                .delete(handlers::recruiting::delete_candidate),
        )
        .route(
            "/api/v1/recruiting/applications",
            post(handlers::recruiting::apply),
        )
        .route(
            "/api/v1/recruiting/applications/{id}",
            get(handlers::recruiting::get_application),
        )
        .route(
            "/api/v1/recruiting/applications/{id}/status",
            put(handlers::recruiting::change_application_status),
        )
        .route(
            "/api/v1/recruiting/applications/{id}/assessment",
            post(handlers::recruiting::link_assessment),
        )
        .route(
            "/api/v1/recruiting/applications/{id}/fit-score",
            post(handlers::recruiting::refresh_fit_score),
        )
        .route(
            "/api/v1/recruiting/applications/{id}/interviews",
            post(handlers::recruiting::schedule_interview)
                .get(handlers::recruiting::list_interviews),
        )
        .route(
            "/api/v1/recruiting/applications/{id}/hire",
            post(handlers::recruiting::hire),
        )
        .route(
            "/api/v1/recruiting/interviews/{id}/complete",
            post(handlers::recruiting::complete_interview),
        )
        .route(
            "/api/v1/recruiting/placements",
            get(handlers::recruiting::list_placements),
        )
        // Billing
        .route("/api/v1/billing/subscribe", post(handlers::billing::subscribe))
        .route(
            "/api/v1/billing/subscription",
            get(handlers::billing::current_subscription),
        )
        .route(
            "/api/v1/billing/subscription/cancel",
            post(handlers::billing::cancel_subscription),
        )
        .route("/api/v1/billing/usage", get(handlers::billing::usage_report))
        .route(
            "/api/v1/billing/usage/increment",
            post(handlers::billing::increment_usage),
        )
        .route(
            "/api/v1/billing/coupons/validate",
            post(handlers::billing::validate_coupon),
        )
        .route(
            "/api/v1/billing/invoices",
            get(handlers::billing::list_invoices),
        )
        .route(
            "/api/v1/billing/invoices/{id}",
            get(handlers::billing::get_invoice),
        )
        .route(
            "/api/v1/billing/invoices/{id}/pay",
            post(handlers::billing::pay_invoice),
        )
        .route(
            "/api/v1/billing/analytics/revenue",
            get(handlers::billing::monthly_revenue),
        )
        .route(
            "/api/v1/billing/analytics/usage-trend",
            get(handlers::billing::usage_trend),
        )
        // Reports
        .route(
            "/api/v1/reports/dashboard",
            get(handlers::reports::dashboard),
        )
        .route(
            "/api/v1/reports/completion-funnel",
            get(handlers::reports::completion_funnel),
        )
        .route("/api/v1/reports", get(handlers::reports::list_reports))
        .route(
            "/api/v1/reports/generate",
            post(handlers::reports::generate_report),
        )
        .route("/api/v1/reports/{id}", get(handlers::reports::get_report))
        // Email templates
        .route(
            "/api/v1/emails/templates",
            post(handlers::emails::create_template).get(handlers::emails::list_templates),
        )
        .route(
            "/api/v1/emails/templates/{id}",
            get(handlers::emails::get_template).put(handlers::emails::update_template),
        )
        // Audit trail
        .route("/api/v1/audit", get(handlers::audit::list_audit_logs))
        .route(
            "/api/v1/audit/recent",
            get(handlers::audit::recent_audit_logs),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit::record_mutations,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant::resolve_tenant,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Combine routes
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(webhook_routes)
        .merge(protected_routes)
        // CORS
        .layer(
            CorsLayer::permissive()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
