//! Serialization of outgoing actions into Web Publishing Engine parameters.

use url::{Url, form_urlencoded};

use crate::errors::{FmError, Result};

/// FileMaker accepts at most nine sort fields per request.
pub const MAX_SORT_FIELDS: usize = 9;

/// Command understood by the XML gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FindAll,
    FindAny,
    Find,
    FindQuery,
    New,
    Edit,
    Delete,
    Duplicate,
    View,
    DatabaseNames,
    LayoutNames,
    ScriptNames,
}

impl Action {
    pub const fn command(self) -> &'static str {
        match self {
            Action::FindAll => "-findall",
            Action::FindAny => "-findany",
            Action::Find => "-find",
            Action::FindQuery => "-findquery",
            Action::New => "-new",
            Action::Edit => "-edit",
            Action::Delete => "-delete",
            Action::Duplicate => "-dup",
            Action::View => "-view",
            Action::DatabaseNames => "-dbnames",
            Action::LayoutNames => "-layoutnames",
            Action::ScriptNames => "-scriptnames",
        }
    }
}

/// Sort direction for one sort field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascend,
    Descend,
    /// Order by the named value list.
    ValueList(String),
}

impl SortOrder {
    pub fn as_param(&self) -> &str {
        match self {
            SortOrder::Ascend => "ascend",
            SortOrder::Descend => "descend",
            SortOrder::ValueList(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// A script name with an optional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCall {
    pub name: String,
    pub param: Option<String>,
}

impl ScriptCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: None,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }
}

/// Optional modifiers attached to an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub max_records: Option<u64>,
    pub skip_records: Option<u64>,
    pub sort: Vec<(String, SortOrder)>,
    pub post_script: Option<ScriptCall>,
    pub pre_find_script: Option<ScriptCall>,
    pub pre_sort_script: Option<ScriptCall>,
    pub response_layout: Option<String>,
    pub logical_operator: Option<LogicalOperator>,
    pub modification_id: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_records(mut self, max: u64) -> Self {
        self.max_records = Some(max);
        self
    }

    pub fn with_skip_records(mut self, skip: u64) -> Self {
        self.skip_records = Some(skip);
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    pub fn with_post_script(mut self, script: ScriptCall) -> Self {
        self.post_script = Some(script);
        self
    }

    pub fn with_pre_find_script(mut self, script: ScriptCall) -> Self {
        self.pre_find_script = Some(script);
        self
    }

    pub fn with_pre_sort_script(mut self, script: ScriptCall) -> Self {
        self.pre_sort_script = Some(script);
        self
    }

    pub fn with_response_layout(mut self, layout: impl Into<String>) -> Self {
        self.response_layout = Some(layout.into());
        self
    }

    pub fn with_logical_operator(mut self, operator: LogicalOperator) -> Self {
        self.logical_operator = Some(operator);
        self
    }

    pub fn with_modification_id(mut self, mod_id: impl Into<String>) -> Self {
        self.modification_id = Some(mod_id.into());
        self
    }

    /// Expands the options into gateway parameters.
    pub fn expand(&self) -> Result<Vec<(String, String)>> {
        if self.sort.len() > MAX_SORT_FIELDS {
            return Err(FmError::Parameter {
                message: format!(
                    "at most {MAX_SORT_FIELDS} sort fields are allowed, got {}",
                    self.sort.len()
                ),
            });
        }

        let mut params = Vec::new();
        if let Some(max) = self.max_records {
            params.push(("-max".to_string(), max.to_string()));
        }
        if let Some(skip) = self.skip_records {
            params.push(("-skip".to_string(), skip.to_string()));
        }
        for (position, (field, order)) in self.sort.iter().enumerate() {
            let index = position + 1;
            params.push((format!("-sortfield.{index}"), field.clone()));
            params.push((format!("-sortorder.{index}"), order.as_param().to_string()));
        }
        push_script(&mut params, "-script", self.post_script.as_ref());
        push_script(&mut params, "-script.prefind", self.pre_find_script.as_ref());
        push_script(&mut params, "-script.presort", self.pre_sort_script.as_ref());
        if let Some(layout) = &self.response_layout {
            params.push(("-lay.response".to_string(), layout.clone()));
        }
        if let Some(operator) = self.logical_operator {
            let value = match operator {
                LogicalOperator::And => "and",
                LogicalOperator::Or => "or",
            };
            params.push(("-lop".to_string(), value.to_string()));
        }
        if let Some(mod_id) = &self.modification_id {
            params.push(("-modid".to_string(), mod_id.clone()));
        }
        Ok(params)
    }
}

fn push_script(params: &mut Vec<(String, String)>, key: &str, script: Option<&ScriptCall>) {
    if let Some(script) = script {
        params.push((key.to_string(), script.name.clone()));
        if let Some(param) = &script.param {
            params.push((format!("{key}.param"), param.clone()));
        }
    }
}

/// One request of a compound `-findquery`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindRequest {
    pub criteria: Vec<(String, String)>,
    /// Omit matching records instead of adding them.
    pub omit: bool,
}

impl FindRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn omit() -> Self {
        Self {
            criteria: Vec::new(),
            omit: true,
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria.push((field.into(), value.into()));
        self
    }
}

/// Builds the `-query` expression and `-qN` parameters for compound finds.
pub fn compound_query(requests: &[FindRequest]) -> Result<Vec<(String, String)>> {
    if requests.iter().all(|request| request.criteria.is_empty()) {
        return Err(FmError::Parameter {
            message: "a compound find needs at least one criterion".to_string(),
        });
    }

    let mut params = Vec::new();
    let mut groups = Vec::new();
    let mut next = 1;
    for request in requests.iter().filter(|request| !request.criteria.is_empty()) {
        let mut ids = Vec::with_capacity(request.criteria.len());
        for (field, value) in &request.criteria {
            let id = format!("q{next}");
            params.push((format!("-{id}"), field.clone()));
            params.push((format!("-{id}.value"), value.clone()));
            ids.push(id);
            next += 1;
        }
        let prefix = if request.omit { "!" } else { "" };
        groups.push(format!("{prefix}({})", ids.join(",")));
    }

    params.insert(0, ("-query".to_string(), groups.join(";")));
    Ok(params)
}

/// A fully assembled gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    action: Action,
    params: Vec<(String, String)>,
}

impl Request {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            params: Vec::new(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn with_database(self, database: &str) -> Self {
        self.with_param("-db", database)
    }

    pub fn with_layout(self, layout: &str) -> Self {
        self.with_param("-lay", layout)
    }

    pub fn with_record_id(self, record_id: &str) -> Self {
        self.with_param("-recid", record_id)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    pub fn with_options(self, options: &QueryOptions) -> Result<Self> {
        Ok(self.with_params(options.expand()?))
    }

    /// Parameters in send order, ending with the action command.
    pub fn params(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .chain(std::iter::once((self.action.command(), "")))
            .collect()
    }

    /// Form-encoded body for a POST to the gateway.
    pub fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params())
            .finish()
    }

    /// The gateway URL with this request as its query string.
    pub fn to_url(&self, gateway: &Url) -> Url {
        let mut url = gateway.clone();
        url.set_query(Some(&self.to_form_body()));
        url
    }
}
