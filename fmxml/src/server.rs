//! Server, database and layout handles.
//!
//! These are thin: each operation assembles a [`Request`], hands it to the
//! [`Transport`], and parses the body with the connection's
//! [`ParseOptions`](crate::ParseOptions).
//!
//! # Example
//! ```ignore
//! let server = Server::new(ConnectionConfig::from_path("fm.toml")?, transport);
//! let people = server.database("Contacts").layout("Web");
//! let found = people.find([("Name", "Bill")], &QueryOptions::new()).await?;
//! for record in &found {
//!     println!("{} {:?}", record.record_id(), record.text("Name"));
//! }
//! ```

use log::info;

use crate::{
    config::ConnectionConfig,
    errors::{FmError, Result},
    request::{Action, FindRequest, QueryOptions, Request, compound_query},
    resultset::{ParsedResponse, parse},
    transport::Transport,
};

/// Entry point for talking to one FileMaker server.
#[derive(Debug, Clone)]
pub struct Server<T> {
    config: ConnectionConfig,
    transport: T,
}

impl<T: Transport> Server<T> {
    pub fn new(config: ConnectionConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn database(&self, name: impl Into<String>) -> Database<'_, T> {
        Database {
            server: self,
            name: name.into(),
        }
    }

    /// A layout in the configured default database.
    pub fn layout(&self, name: impl Into<String>) -> Result<Layout<'_, T>> {
        let database = self.config.database.clone().ok_or_else(|| FmError::Parameter {
            message: "no default database configured".to_string(),
        })?;
        Ok(self.database(database).layout(name))
    }

    /// Names of the databases hosted by the server.
    pub async fn database_names(&self) -> Result<Vec<String>> {
        let response = self.execute(Request::new(Action::DatabaseNames)).await?;
        Ok(names(&response, "DATABASE_NAME"))
    }

    /// Sends a request and parses the response.
    pub async fn execute(&self, request: Request) -> Result<ParsedResponse> {
        let gateway = self.config.gateway_url()?;
        let context = self.config.request_context()?;
        if self.config.log_actions {
            info!("{}", request.to_url(&gateway));
        }

        let body = self.transport.post(&gateway, request.to_form_body(), &context).await?;
        if self.config.log_responses {
            info!("{}", String::from_utf8_lossy(&body));
        }

        parse(&body, &self.config.parse_options())
    }
}

fn names(response: &ParsedResponse, field: &str) -> Vec<String> {
    response
        .iter()
        .filter_map(|record| record.text(field))
        .map(str::to_string)
        .collect()
}

/// A database hosted on a [`Server`].
#[derive(Debug, Clone)]
pub struct Database<'a, T> {
    server: &'a Server<T>,
    name: String,
}

impl<'a, T: Transport> Database<'a, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self, name: impl Into<String>) -> Layout<'a, T> {
        Layout {
            server: self.server,
            database: self.name.clone(),
            name: name.into(),
        }
    }

    pub async fn layout_names(&self) -> Result<Vec<String>> {
        let request = Request::new(Action::LayoutNames).with_database(&self.name);
        let response = self.server.execute(request).await?;
        Ok(names(&response, "LAYOUT_NAME"))
    }

    pub async fn script_names(&self) -> Result<Vec<String>> {
        let request = Request::new(Action::ScriptNames).with_database(&self.name);
        let response = self.server.execute(request).await?;
        Ok(names(&response, "SCRIPT_NAME"))
    }
}

/// A layout within a database; all record operations go through one.
#[derive(Debug, Clone)]
pub struct Layout<'a, T> {
    server: &'a Server<T>,
    database: String,
    name: String,
}

impl<'a, T: Transport> Layout<'a, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn request(&self, action: Action) -> Request {
        Request::new(action).with_database(&self.database).with_layout(&self.name)
    }

    /// Every record on the layout.
    pub async fn all(&self, options: &QueryOptions) -> Result<ParsedResponse> {
        self.server.execute(self.request(Action::FindAll).with_options(options)?).await
    }

    /// One arbitrary record.
    pub async fn any(&self, options: &QueryOptions) -> Result<ParsedResponse> {
        self.server.execute(self.request(Action::FindAny).with_options(options)?).await
    }

    /// Records matching all of the given field criteria.
    pub async fn find<K, V>(
        &self,
        criteria: impl IntoIterator<Item = (K, V)>,
        options: &QueryOptions,
    ) -> Result<ParsedResponse>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = self.request(Action::Find).with_params(criteria).with_options(options)?;
        self.server.execute(request).await
    }

    pub async fn find_by_record_id(&self, record_id: &str) -> Result<ParsedResponse> {
        require_record_id(record_id)?;
        self.server.execute(self.request(Action::Find).with_record_id(record_id)).await
    }

    /// Compound find combining several requests, some of which may omit.
    pub async fn query(&self, requests: &[FindRequest], options: &QueryOptions) -> Result<ParsedResponse> {
        let request = self
            .request(Action::FindQuery)
            .with_params(compound_query(requests)?)
            .with_options(options)?;
        self.server.execute(request).await
    }

    pub async fn create<K, V>(
        &self,
        values: impl IntoIterator<Item = (K, V)>,
        options: &QueryOptions,
    ) -> Result<ParsedResponse>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = self.request(Action::New).with_params(values).with_options(options)?;
        self.server.execute(request).await
    }

    /// Updates a record. Set [`QueryOptions::modification_id`] to have the
    /// server reject the edit when the record changed since it was read.
    pub async fn edit<K, V>(
        &self,
        record_id: &str,
        values: impl IntoIterator<Item = (K, V)>,
        options: &QueryOptions,
    ) -> Result<ParsedResponse>
    where
        K: Into<String>,
        V: Into<String>,
    {
        require_record_id(record_id)?;
        let request = self
            .request(Action::Edit)
            .with_record_id(record_id)
            .with_params(values)
            .with_options(options)?;
        self.server.execute(request).await
    }

    pub async fn delete(&self, record_id: &str, options: &QueryOptions) -> Result<ParsedResponse> {
        require_record_id(record_id)?;
        let request = self.request(Action::Delete).with_record_id(record_id).with_options(options)?;
        self.server.execute(request).await
    }

    pub async fn duplicate(&self, record_id: &str, options: &QueryOptions) -> Result<ParsedResponse> {
        require_record_id(record_id)?;
        let request = self
            .request(Action::Duplicate)
            .with_record_id(record_id)
            .with_options(options)?;
        self.server.execute(request).await
    }

    /// Layout metadata with no records.
    pub async fn view(&self) -> Result<ParsedResponse> {
        self.server.execute(self.request(Action::View)).await
    }
}

fn require_record_id(record_id: &str) -> Result<()> {
    if record_id.trim().is_empty() {
        return Err(FmError::Parameter {
            message: "a record id is required".to_string(),
        });
    }
    Ok(())
}
