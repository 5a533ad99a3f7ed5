//! Connection setup: sqlite-vec registration, pragmas and the in-process
//! cosine distance function.

use std::sync::Once;

use ledger_vectordb_core::cosine_distance;
use rusqlite::Connection;
use rusqlite::ffi::sqlite3_auto_extension;
use rusqlite::functions::FunctionFlags;
use sqlite_vec::sqlite3_vec_init;

/// SQL name of the scalar registered on every pooled connection.
pub(crate) const COSINE_DISTANCE_FN: &str = "cosine_distance";

static VEC_EXTENSION: Once = Once::new();

/// Register sqlite-vec as an auto extension.
/// Must run BEFORE the pool opens its first connection; repeat calls are no-ops.
#[allow(clippy::missing_transmute_annotations)]
pub fn init_sqlite_vec() {
    VEC_EXTENSION.call_once(|| {
        unsafe {
            sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
        }
        tracing::info!("sqlite-vec extension registered");
    });
}

/// Per-connection initializer handed to the r2d2 manager.
pub(crate) fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    register_cosine_distance(conn)
}

/// `cosine_distance(a, b)` over two float32 blobs; NULL for zero-norm or
/// mismatched vectors so they sort after every real candidate.
fn register_cosine_distance(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        COSINE_DISTANCE_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a = decode_f32_blob(&ctx.get::<Vec<u8>>(0)?);
            let b = decode_f32_blob(&ctx.get::<Vec<u8>>(1)?);
            match (a, b) {
                (Some(a), Some(b)) => Ok(cosine_distance(&a, &b)),
                _ => Err(rusqlite::Error::UserFunctionError(
                    "cosine_distance expects float32 vector blobs".into(),
                )),
            }
        },
    )
}

/// Decode a sqlite-vec float32 blob (native byte order).
pub(crate) fn decode_f32_blob(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn decodes_native_float_blob() {
        let values = [1.0_f32, -2.5, 0.125];
        assert_eq!(decode_f32_blob(values.as_bytes()).unwrap(), values.to_vec());
        assert!(decode_f32_blob(&[0, 1, 2]).is_none());
    }

    #[test]
    fn cosine_function_is_callable_from_sql() {
        init_sqlite_vec();
        let mut conn = Connection::open_in_memory().unwrap();
        init_connection(&mut conn).unwrap();
        let a = [1.0_f32, 2.0, 3.0];
        let b = [2.0_f32, 4.0, 6.0];
        let d: f64 = conn
            .query_row("SELECT cosine_distance(?1, ?2)", (a.as_bytes(), b.as_bytes()), |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(d, 0.0);
        let zero = [0.0_f32; 3];
        let null: Option<f64> = conn
            .query_row("SELECT cosine_distance(?1, ?2)", (a.as_bytes(), zero.as_bytes()), |row| {
                row.get(0)
            })
            .unwrap();
        assert!(null.is_none());
    }
}
