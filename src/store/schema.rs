use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const COMPANY_FK: ForeignKey = ForeignKey {
    foreign_table: "company",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const JOB_FK: ForeignKey = ForeignKey {
    foreign_table: "job",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SKILL_FK: ForeignKey = ForeignKey {
    foreign_table: "skill",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SUBSCRIBER_FK: ForeignKey = ForeignKey {
    foreign_table: "subscriber",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const COMPANY_TABLE_V1: Table = Table {
    name: "company",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text),
        sqlite_column!("logo", &SqlType::Text),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated_at", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

const USER_TABLE_V1: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!("password_hash", &SqlType::Text),
        sqlite_column!("age", &SqlType::Integer),
        sqlite_column!("gender", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text),
        sqlite_column!("avatar", &SqlType::Text),
        sqlite_column!("cv", &SqlType::Text),
        sqlite_column!("role", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "company_id",
            &SqlType::Integer,
            foreign_key = Some(&COMPANY_FK)
        ),
        sqlite_column!("refresh_token", &SqlType::Text),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated_at", &SqlType::Integer),
    ],
    indices: &[("idx_user_company", "company_id")],
    unique_constraints: &[&["email"]],
};

const SKILL_TABLE_V1: Table = Table {
    name: "skill",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

const JOB_TABLE_V1: Table = Table {
    name: "job",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text, non_null = true),
        sqlite_column!("salary", &SqlType::Real, non_null = true),
        sqlite_column!("quantity", &SqlType::Integer, non_null = true),
        sqlite_column!("level", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("start_date", &SqlType::Integer, non_null = true),
        sqlite_column!("end_date", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "company_id",
            &SqlType::Integer,
            foreign_key = Some(&COMPANY_FK)
        ),
        sqlite_column!("created_by", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated_at", &SqlType::Integer),
    ],
    indices: &[
        ("idx_job_company", "company_id"),
        ("idx_job_active_end_date", "active, end_date"),
    ],
    unique_constraints: &[],
};

const JOB_SKILL_TABLE_V1: Table = Table {
    name: "job_skill",
    columns: &[
        sqlite_column!(
            "job_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&JOB_FK)
        ),
        sqlite_column!(
            "skill_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SKILL_FK)
        ),
    ],
    indices: &[("idx_job_skill_skill", "skill_id")],
    unique_constraints: &[&["job_id", "skill_id"]],
};

const RESUME_TABLE_V1: Table = Table {
    name: "resume",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "job_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&JOB_FK)
        ),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated_at", &SqlType::Integer),
        sqlite_column!("updated_by", &SqlType::Text),
    ],
    indices: &[
        ("idx_resume_job_status", "job_id, status"),
        ("idx_resume_user", "user_id"),
    ],
    unique_constraints: &[&["user_id", "job_id"]],
};

const SUBSCRIBER_TABLE_V1: Table = Table {
    name: "subscriber",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["email"]],
};

const SUBSCRIBER_SKILL_TABLE_V1: Table = Table {
    name: "subscriber_skill",
    columns: &[
        sqlite_column!(
            "subscriber_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SUBSCRIBER_FK)
        ),
        sqlite_column!(
            "skill_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SKILL_FK)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["subscriber_id", "skill_id"]],
};

const NOTIFICATION_TABLE_V1: Table = Table {
    name: "notification",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("notification_type", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!("job_name", &SqlType::Text),
        sqlite_column!("company_name", &SqlType::Text),
        sqlite_column!("resume_id", &SqlType::Integer),
        sqlite_column!(
            "read",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_notification_user_read", "user_id, read")],
    unique_constraints: &[],
};

pub static STORE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        COMPANY_TABLE_V1,
        USER_TABLE_V1,
        SKILL_TABLE_V1,
        JOB_TABLE_V1,
        JOB_SKILL_TABLE_V1,
        RESUME_TABLE_V1,
        SUBSCRIBER_TABLE_V1,
        SUBSCRIBER_SKILL_TABLE_V1,
        NOTIFICATION_TABLE_V1,
    ],
    migration: None,
}];
