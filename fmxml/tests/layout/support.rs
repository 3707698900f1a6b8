use std::sync::Mutex;

use fmxml::{ConnectionConfig, FmError, RequestContext, Result, Server, Transport};
use url::Url;

pub const PEOPLE: &str = include_str!("../fixtures/people.xml");
pub const NO_RECORDS: &str = include_str!("../fixtures/no_records.xml");
pub const DATABASE_NAMES: &str = include_str!("../fixtures/database_names.xml");

/// Answers every post with a canned body and remembers what was sent.
pub struct RecordingTransport {
    reply: std::result::Result<Vec<u8>, u16>,
    sent: Mutex<Vec<(Url, String, RequestContext)>>,
}

impl RecordingTransport {
    pub fn replying(body: &str) -> Self {
        Self {
            reply: Ok(body.as_bytes().to_vec()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, body, _)| body.clone()).collect()
    }

    pub fn last_body(&self) -> String {
        self.bodies().pop().expect("nothing was sent")
    }

    pub fn last_context(&self) -> RequestContext {
        self.sent.lock().unwrap().last().map(|(_, _, context)| context.clone()).expect("nothing was sent")
    }

    pub fn last_url(&self) -> Url {
        self.sent.lock().unwrap().last().map(|(url, _, _)| url.clone()).expect("nothing was sent")
    }
}

impl Transport for RecordingTransport {
    async fn post(&self, url: &Url, body: String, context: &RequestContext) -> Result<Vec<u8>> {
        self.sent.lock().unwrap().push((url.clone(), body, context.clone()));
        match &self.reply {
            Ok(bytes) => Ok(bytes.clone()),
            Err(status) => Err(FmError::from_status(*status, "canned failure")),
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn server(transport: RecordingTransport) -> Server<RecordingTransport> {
    init_logging();
    let config = ConnectionConfig::new("fm.example.com")
        .with_credentials("web", "secret")
        .with_database("Contacts")
        .with_portals(true);
    Server::new(config, transport)
}
