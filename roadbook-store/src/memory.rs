use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use roadbook_core::store::{Documents, Store};
use roadbook_core::BookingError;

/// In-memory transactional document store.
///
/// Transactions clone the committed document set, run the closure against
/// the draft, and publish the draft only on success. The write lock is held
/// for the whole closure, so transactions serialize and readers never
/// observe a transaction's intermediate writes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Documents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Documents) -> R + Send + 'static,
        R: Send + 'static,
    {
        let docs = self.inner.read().await;
        f(&docs)
    }

    async fn transact<F, R>(&self, f: F) -> Result<R, BookingError>
    where
        F: FnOnce(&mut Documents) -> Result<R, BookingError> + Send + 'static,
        R: Send + 'static,
    {
        let mut docs = self.inner.write().await;
        let mut draft = docs.clone();
        match f(&mut draft) {
            Ok(value) => {
                *docs = draft;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roadbook_core::models::{Seat, SeatStatus};
    use uuid::Uuid;

    fn seat(trip_id: Uuid, number: i32) -> Seat {
        Seat {
            id: Uuid::new_v4(),
            trip_id,
            seat_number: number,
            status: SeatStatus::Available,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_transact_commits_on_ok() {
        let store = MemoryStore::new();
        let s = seat(Uuid::new_v4(), 1);
        let seat_id = s.id;

        store
            .transact(move |docs| {
                docs.seats.insert(s.id, s);
                Ok(())
            })
            .await
            .unwrap();

        let committed = store.read(move |docs| docs.seats.contains_key(&seat_id)).await;
        assert!(committed);
    }

    #[tokio::test]
    async fn test_transact_rolls_back_every_staged_write() {
        let store = MemoryStore::new();
        let trip_id = Uuid::new_v4();
        let existing = seat(trip_id, 1);
        let existing_id = existing.id;
        store
            .transact(move |docs| {
                docs.seats.insert(existing.id, existing);
                Ok(())
            })
            .await
            .unwrap();

        // Stage two writes, then fail: neither may survive.
        let result: Result<(), _> = store
            .transact(move |docs| {
                docs.seat_mut(existing_id)?.status = SeatStatus::Booked;
                let extra = seat(trip_id, 2);
                docs.seats.insert(extra.id, extra);
                Err(BookingError::Internal("boom".to_string()))
            })
            .await;
        assert!(result.is_err());

        let (status, count) = store
            .read(move |docs| (docs.seats[&existing_id].status, docs.seats.len()))
            .await;
        assert_eq!(status, SeatStatus::Available);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_transactions_serialize() {
        let store = MemoryStore::new();
        let s = seat(Uuid::new_v4(), 1);
        let seat_id = s.id;
        store
            .transact(move |docs| {
                docs.seats.insert(s.id, s);
                Ok(())
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transact(move |docs| {
                        let seat = docs.seat_mut(seat_id)?;
                        if seat.status != SeatStatus::Available {
                            return Err(BookingError::Conflict("taken".to_string()));
                        }
                        seat.status = SeatStatus::Booked;
                        Ok(())
                    })
                    .await
            }));
        }

        let mut won = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                won += 1;
            }
        }
        assert_eq!(won, 1);
    }
}
