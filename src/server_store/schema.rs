use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const BACKGROUND_RUNS_TABLE: Table = Table {
    name: "background_runs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("job_id", &SqlType::Text, non_null = true),
        sqlite_column!("triggered_by", &SqlType::Text, non_null = true),
        // Unix seconds
        sqlite_column!("started_at", &SqlType::Integer, non_null = true),
        sqlite_column!("finished_at", &SqlType::Integer),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "affected",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("summary", &SqlType::Text),
        sqlite_column!("error_message", &SqlType::Text),
    ],
    indices: &[
        ("idx_background_runs_job", "job_id, id DESC"),
        ("idx_background_runs_status", "status"),
    ],
    unique_constraints: &[],
};

const BACKGROUND_SCHEDULES_TABLE: Table = Table {
    name: "background_schedules",
    columns: &[
        sqlite_column!("job_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("next_run_at", &SqlType::Integer, non_null = true),
        sqlite_column!("last_run_at", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

const SERVER_STATE_TABLE: Table = Table {
    name: "server_state",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
        sqlite_column!("expires_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_server_state_expires_at", "expires_at")],
    unique_constraints: &[],
};

pub static SERVER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        BACKGROUND_RUNS_TABLE,
        BACKGROUND_SCHEDULES_TABLE,
        SERVER_STATE_TABLE,
    ],
    migration: None,
}];
