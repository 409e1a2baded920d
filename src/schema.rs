// Table definitions for the SQLite schema created by `DbContext::init_schema`.

diesel::table! {
    companies (id) {
        id -> Text,
        name -> Text,
        logo_url -> Nullable<Text>,
        website -> Nullable<Text>,
        careers_url -> Text,
        industry -> Nullable<Text>,
        size -> Nullable<Text>,
        is_enabled -> Integer,
        scrape_config -> Text,
        last_scraped_at -> Nullable<Text>,
        last_jobs_found -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    jobs (id) {
        id -> Text,
        company_id -> Text,
        title -> Text,
        slug -> Text,
        description -> Text,
        requirements -> Nullable<Text>,
        location -> Text,
        work_arrangement -> Text,
        salary_min -> Nullable<Integer>,
        salary_max -> Nullable<Integer>,
        salary_currency -> Text,
        salary_period -> Nullable<Text>,
        duration -> Nullable<Text>,
        duration_months -> Nullable<Integer>,
        application_url -> Text,
        posted_at -> Text,
        dedup_key -> Text,
        content_hash -> Text,
        is_active -> Integer,
        inactive_reason -> Nullable<Text>,
        first_seen_at -> Text,
        last_seen_at -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    scraper_logs (id) {
        id -> Integer,
        started_at -> Text,
        completed_at -> Nullable<Text>,
        status -> Text,
        triggered_by -> Text,
        companies_processed -> Integer,
        jobs_found -> Integer,
        jobs_added -> Integer,
        jobs_updated -> Integer,
        jobs_skipped -> Integer,
        jobs_deactivated -> Integer,
        errors -> Text,
    }
}

diesel::table! {
    contact_messages (id) {
        id -> Text,
        name -> Text,
        email -> Text,
        subject -> Nullable<Text>,
        message -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(jobs -> companies (company_id));

diesel::allow_tables_to_appear_in_same_query!(companies, jobs, scraper_logs, contact_messages,);
