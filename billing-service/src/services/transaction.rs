//! Ledger read use-cases.

use crate::errors::TransactionError;
use crate::models::Transaction;
use crate::repositories::TransactionRepository;
use crate::services::pagination::{PaginationParams, PaginationResult};
use crate::specifications::TransactionSpecification;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::persistence::{ListArgs, Session, Sort};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetTransactionParams {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTransactionsParams {
    pub description_like: Option<String>,
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTransactionsResult {
    pub transactions: Vec<Transaction>,
    pub pagination: PaginationResult,
}

pub struct TransactionService {
    transactions: TransactionRepository,
}

impl TransactionService {
    pub fn new(transactions: TransactionRepository) -> Self {
        Self { transactions }
    }

    #[instrument(skip(self), fields(transaction_id = %params.id))]
    pub async fn get_transaction(&self, params: GetTransactionParams) -> Result<Transaction, AppError> {
        self.transactions
            .get(&Session::new(), &[TransactionSpecification::WithId(params.id)])
            .await?
            .ok_or_else(|| TransactionError::NotFound.into())
    }

    #[instrument(skip(self, params))]
    pub async fn list_transactions(
        &self,
        params: ListTransactionsParams,
    ) -> Result<ListTransactionsResult, AppError> {
        let pagination = params.pagination.normalize();
        let specs: Vec<_> = params
            .description_like
            .map(TransactionSpecification::DescriptionLike)
            .into_iter()
            .collect();
        let session = Session::new();

        let size = self.transactions.size(&session, &specs).await?;
        let args = ListArgs::new(specs)
            .with_sort(Sort::desc("created_at"))
            .with_limit(pagination.limit())
            .with_offset(pagination.offset());
        let transactions = self.transactions.list(&session, &args).await?;

        Ok(ListTransactionsResult {
            transactions,
            pagination: PaginationResult::new(pagination, size),
        })
    }
}
