#![cfg(feature = "sqlite")]

mod common;

use chrono::Utc;
use sql_keyset::prelude::*;

fn insert_op(id: &str) -> WriteOp {
    single_write_op(
        |args| {
            let now = Utc::now();
            args.push(RowValues::Timestamp(now));
            args.push(RowValues::Timestamp(now));
        },
        "INSERT INTO test (id, name, createdAt, updatedAt) VALUES (?1, ?2, ?3, ?4)",
        vec![RowValues::from(id), RowValues::from("tx")],
    )
}

#[tokio::test]
async fn failing_third_op_rolls_back_all_five() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;

    let missing_update = single_write_op(
        |_| {},
        "UPDATE test SET note = 'x' WHERE id = ?1",
        vec![RowValues::from("does-not-exist")],
    );
    let ops = vec![
        Some(insert_op("a")),
        Some(insert_op("b")),
        Some(missing_update),
        Some(insert_op("d")),
        Some(insert_op("e")),
    ];
    let err = run_multiple_writes(&pool, ops).await.unwrap_err();
    assert!(matches!(
        err,
        SqlKeysetError::NoRowsUpdated {
            expected: 1,
            actual: 0
        }
    ));
    assert_eq!(common::count_rows(&pool).await?, 0);

    let duplicate = vec![
        Some(insert_op("a")),
        Some(insert_op("b")),
        Some(insert_op("a")),
        Some(insert_op("d")),
        Some(insert_op("e")),
    ];
    let err = run_multiple_writes(&pool, duplicate).await.unwrap_err();
    assert!(matches!(err, SqlKeysetError::SqliteError(_)));
    assert_eq!(common::count_rows(&pool).await?, 0);
    Ok(())
}

#[tokio::test]
async fn panicking_op_rolls_back_and_reports() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;

    let boom: WriteOp = Box::new(|_tx: &Tx<'_>| -> Result<(), SqlKeysetError> {
        panic!("write exploded")
    });
    let ops = vec![
        Some(insert_op("a")),
        Some(insert_op("b")),
        Some(boom),
        Some(insert_op("d")),
        Some(insert_op("e")),
    ];
    match run_multiple_writes(&pool, ops).await {
        Err(SqlKeysetError::OperationPanicked(message)) => {
            assert!(message.contains("write exploded"));
        }
        other => panic!("expected OperationPanicked, got {other:?}"),
    }
    assert_eq!(common::count_rows(&pool).await?, 0);

    // the pool is still usable after the contained panic
    run_multiple_writes(&pool, vec![Some(insert_op("after"))]).await?;
    assert_eq!(common::count_rows(&pool).await?, 1);
    Ok(())
}

#[tokio::test]
async fn update_matching_nothing_is_no_rows_updated() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;

    let result = run_single_write(
        &pool,
        |_| {},
        "UPDATE test SET note = ?1 WHERE id = ?2",
        vec![RowValues::from("note"), RowValues::from("ghost")],
    )
    .await;
    assert!(matches!(
        result,
        Err(SqlKeysetError::NoRowsUpdated {
            expected: 1,
            actual: 0
        })
    ));
    Ok(())
}

#[tokio::test]
async fn update_matching_two_rows_is_rolled_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;
    common::seed_rows(&pool, "pair", 0, 2).await?;

    let result = run_single_write(
        &pool,
        |_| {},
        "UPDATE test SET note = ?1 WHERE name = ?2",
        vec![RowValues::from("note"), RowValues::from("pair")],
    )
    .await;
    assert!(matches!(
        result,
        Err(SqlKeysetError::NoRowsUpdated {
            expected: 1,
            actual: 2
        })
    ));

    let noted: i64 = query_one(
        &pool,
        "SELECT COUNT(*) FROM test WHERE note IS NOT NULL",
        &[],
        |row| Ok(row.get(0)?),
    )
    .await?;
    assert_eq!(noted, 0);
    assert_eq!(common::count_rows(&pool).await?, 2);
    Ok(())
}

#[tokio::test]
async fn single_write_stamps_arguments_before_executing() -> Result<(), Box<dyn std::error::Error>>
{
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;
    let before = Utc::now();

    let mut row = BasePaginateable::default();
    row.quick_fix();
    let id = row.id.clone();
    run_single_write(
        &pool,
        |args| {
            let now = Utc::now();
            args.push(RowValues::Timestamp(now));
            args.push(RowValues::Timestamp(now));
        },
        "INSERT INTO test (id, name, createdAt, updatedAt) VALUES (?1, ?2, ?3, ?4)",
        vec![RowValues::from(id.clone()), RowValues::from("stamped")],
    )
    .await?;

    let created = query_one(
        &pool,
        "SELECT createdAt FROM test WHERE id = ?1",
        &[RowValues::from(id)],
        |row| timestamp_at(row, 0),
    )
    .await?;
    assert!(created >= before);
    Ok(())
}

#[tokio::test]
async fn empty_ops_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;

    run_multiple_writes(&pool, vec![Some(insert_op("a")), None, Some(insert_op("c"))]).await?;
    assert_eq!(common::count_rows(&pool).await?, 2);

    run_multiple_writes(&pool, vec![None, None]).await?;
    assert_eq!(common::count_rows(&pool).await?, 2);
    Ok(())
}

#[tokio::test]
async fn query_one_without_rows_is_the_driver_no_rows_error()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;

    let err = query_one(
        &pool,
        "SELECT id FROM test WHERE id = ?1",
        &[RowValues::from("nobody")],
        |row| Ok(row.get::<_, String>(0)?),
    )
    .await
    .unwrap_err();
    assert!(err.is_no_rows());
    assert!(matches!(
        err,
        SqlKeysetError::SqliteError(rusqlite::Error::QueryReturnedNoRows)
    ));
    Ok(())
}

#[tokio::test]
async fn transaction_reads_its_own_writes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let pool = common::migrated_pool(&dir).await?;
    common::seed_rows(&pool, "seed", 0, 3).await?;

    let ids = run_in_transaction(&pool, |tx| {
        tx.execute_expecting(
            |args| args.insert(0, RowValues::from("renamed")),
            "UPDATE test SET name = ?1 WHERE name = ?2",
            vec![RowValues::from("seed")],
            Some(3),
        )?;
        tx.query_many(
            "SELECT id FROM test WHERE name = ?1 ORDER BY id",
            &[RowValues::from("renamed")],
            |row| Ok(row.get::<_, String>(0)?),
        )
    })
    .await?;
    assert_eq!(ids.len(), 3);

    let renamed = query_many(
        &pool,
        "SELECT id FROM test WHERE name = 'renamed'",
        &[],
        |row| Ok(row.get::<_, String>(0)?),
    )
    .await?;
    assert_eq!(renamed.len(), 3);
    Ok(())
}
