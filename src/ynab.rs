use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, TidyError};
use crate::models::{Category, Payee, Transaction, TransactionUpdate};
use crate::settings::Config;

/// The slice of the YNAB API the tools rely on. Handed to each tool
/// explicitly so tests can substitute an in-memory budget.
pub trait BudgetService {
    /// All payees for the budget, deleted ones included.
    fn list_payees(&self) -> Result<Vec<Payee>>;
    fn list_transactions(&self) -> Result<Vec<Transaction>>;
    fn list_transactions_by_payee(&self, payee_id: &str) -> Result<Vec<Transaction>>;
    fn update_transaction_payee(&self, transaction_id: &str, payee_id: &str) -> Result<()>;
    fn set_payee_deleted(&self, payee_id: &str, deleted: bool) -> Result<()>;
    fn list_categories(&self) -> Result<Vec<Category>>;
    fn update_transaction(&self, transaction_id: &str, update: &TransactionUpdate) -> Result<()>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct PayeesData {
    payees: Vec<Payee>,
}

#[derive(Deserialize)]
struct TransactionsData {
    transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
struct CategoriesData {
    category_groups: Vec<CategoryGroup>,
}

#[derive(Deserialize)]
struct CategoryGroup {
    #[serde(default)]
    categories: Vec<Category>,
}

pub struct YnabClient {
    client: Client,
    base_url: String,
    budget_id: String,
    api_key: String,
}

impl YnabClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ynab-tidy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            budget_id: config.budget_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/budgets/{}{}", self.base_url, self.budget_id, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.api_key).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TidyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let envelope: Envelope<T> = self.send(self.client.get(&url))?.json()?;
        Ok(envelope.data)
    }
}

impl BudgetService for YnabClient {
    fn list_payees(&self) -> Result<Vec<Payee>> {
        let data: PayeesData = self.get("/payees")?;
        Ok(data.payees)
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let data: TransactionsData = self.get("/transactions")?;
        Ok(data.transactions)
    }

    fn list_transactions_by_payee(&self, payee_id: &str) -> Result<Vec<Transaction>> {
        let data: TransactionsData = self.get(&format!("/payees/{payee_id}/transactions"))?;
        Ok(data.transactions)
    }

    fn update_transaction_payee(&self, transaction_id: &str, payee_id: &str) -> Result<()> {
        let update = TransactionUpdate {
            payee_id: Some(payee_id.to_string()),
            ..Default::default()
        };
        self.update_transaction(transaction_id, &update)
    }

    fn set_payee_deleted(&self, payee_id: &str, deleted: bool) -> Result<()> {
        let url = self.url(&format!("/payees/{payee_id}"));
        tracing::info!(%payee_id, deleted, "PATCH payee");
        self.send(
            self.client
                .patch(&url)
                .json(&json!({ "payee": { "deleted": deleted } })),
        )?;
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let data: CategoriesData = self.get("/categories")?;
        Ok(data
            .category_groups
            .into_iter()
            .flat_map(|g| g.categories)
            .collect())
    }

    fn update_transaction(&self, transaction_id: &str, update: &TransactionUpdate) -> Result<()> {
        let url = self.url(&format!("/transactions/{transaction_id}"));
        tracing::info!(%transaction_id, ?update, "PUT transaction");
        self.send(self.client.put(&url).json(&json!({ "transaction": update })))?;
        Ok(())
    }
}
