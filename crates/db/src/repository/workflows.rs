//! Workflow CRUD and graph persistence.
//!
//! The graph save path is delete-and-recreate: a single transaction removes
//! every node (and, with them, every connection) and re-inserts the submitted
//! set.  Client-supplied node ids are preserved verbatim so references to
//! nodes stay valid across saves.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{ConnectionRow, NewConnection, NewNode, NodeRow, WorkflowRow},
    DbError,
};

/// Default handle name used when the editor omits one.
const DEFAULT_HANDLE: &str = "main";

/// A workflow together with its full graph.
#[derive(Debug, Clone)]
pub struct WorkflowGraphRecord {
    pub workflow: WorkflowRow,
    pub nodes: Vec<NodeRow>,
    pub connections: Vec<ConnectionRow>,
}

/// Insert a new workflow owned by `user_id`, seeded with the given entry
/// node, in a single transaction.
pub async fn create_workflow(
    pool: &PgPool,
    name: &str,
    user_id: &str,
    seed_node: NewNode,
) -> Result<WorkflowRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let workflow = sqlx::query_as::<_, WorkflowRow>(
        r#"
        INSERT INTO workflows (id, name, user_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id, name, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(user_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_node(&mut tx, id, &seed_node).await?;

    tx.commit().await?;
    Ok(workflow)
}

/// Fetch a single workflow by primary key, restricted to the owning user.
pub async fn get_workflow(pool: &PgPool, id: Uuid, user_id: &str) -> Result<WorkflowRow, DbError> {
    sqlx::query_as::<_, WorkflowRow>(
        r#"
        SELECT id, name, user_id, created_at, updated_at
        FROM workflows
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Return all of a user's workflows, newest first.
pub async fn list_workflows(pool: &PgPool, user_id: &str) -> Result<Vec<WorkflowRow>, DbError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
        r#"
        SELECT id, name, user_id, created_at, updated_at
        FROM workflows
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch a workflow together with its nodes and connections.
///
/// Returns `DbError::NotFound` when the workflow is absent or owned by a
/// different user.
pub async fn get_workflow_with_graph(
    pool: &PgPool,
    id: Uuid,
    user_id: &str,
) -> Result<WorkflowGraphRecord, DbError> {
    let workflow = get_workflow(pool, id, user_id).await?;

    let nodes = sqlx::query_as::<_, NodeRow>(
        r#"
        SELECT id, workflow_id, name, node_type, position, data, created_at, updated_at
        FROM nodes
        WHERE workflow_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let connections = sqlx::query_as::<_, ConnectionRow>(
        r#"
        SELECT id, workflow_id, from_node_id, to_node_id, from_output, to_input,
               created_at, updated_at
        FROM connections
        WHERE workflow_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(WorkflowGraphRecord { workflow, nodes, connections })
}

/// Replace a workflow's entire graph in one transaction.
///
/// Ownership is checked first: an absent workflow is `NotFound`, a workflow
/// owned by someone else is `NotAuthorized` and nothing is written.
pub async fn replace_graph(
    pool: &PgPool,
    id: Uuid,
    user_id: &str,
    nodes: Vec<NewNode>,
    connections: Vec<NewConnection>,
) -> Result<WorkflowRow, DbError> {
    let mut tx = pool.begin().await?;

    let owner: Option<String> =
        sqlx::query_scalar::<_, String>("SELECT user_id FROM workflows WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    match owner {
        None => return Err(DbError::NotFound),
        Some(owner) if owner != user_id => return Err(DbError::NotAuthorized),
        Some(_) => {}
    }

    sqlx::query("DELETE FROM connections WHERE workflow_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM nodes WHERE workflow_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for node in &nodes {
        insert_node(&mut tx, id, node).await?;
    }

    let now = Utc::now();
    for connection in &connections {
        sqlx::query(
            r#"
            INSERT INTO connections
                (id, workflow_id, from_node_id, to_node_id, from_output, to_input,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(&connection.from_node_id)
        .bind(&connection.to_node_id)
        .bind(connection.from_output.as_deref().unwrap_or(DEFAULT_HANDLE))
        .bind(connection.to_input.as_deref().unwrap_or(DEFAULT_HANDLE))
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    let workflow = sqlx::query_as::<_, WorkflowRow>(
        r#"
        UPDATE workflows
        SET updated_at = $2
        WHERE id = $1
        RETURNING id, name, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(workflow)
}

/// Permanently delete a workflow.  Nodes and connections go with it via
/// cascading foreign keys.
pub async fn delete_workflow(pool: &PgPool, id: Uuid, user_id: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM workflows WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

async fn insert_node(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    workflow_id: Uuid,
    node: &NewNode,
) -> Result<(), DbError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO nodes
            (id, workflow_id, name, node_type, position, data, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        "#,
    )
    .bind(&node.id)
    .bind(workflow_id)
    .bind(node.name.as_deref().unwrap_or(&node.node_type))
    .bind(&node.node_type)
    .bind(&node.position)
    .bind(&node.data)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
