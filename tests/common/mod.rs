//! In-process apollo server for integration tests.
#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    io::Write,
    net::{SocketAddr, TcpListener, TcpStream},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::Mutex;
use prost::Message;
use pundun::{
    Session, SessionConfig, TlsVerification, Value,
    protocol::{
        apollo::{self, ApolloPdu, apollo_pdu::Procedure, response},
        frame::{FrameReader, encode_frame, read_preauth, write_preauth},
    },
    transport::{TlsStream, tls},
    value::decode_fields,
};
use rand::Rng;
use rustls::{
    ServerConfig, ServerConnection, StreamOwned,
    pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer},
};

/// How the fake server treats each connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answer every call, in whatever order the worker threads finish.
    Serve,
    /// Read one frame, then close the connection without answering.
    HangUpAfterFirstCall,
    /// Read frames forever, never answer.
    Silent,
    /// Refuse the handshake with `e=invalid-proof`.
    RejectAuth,
}

type Row = (Vec<apollo::Field>, Vec<apollo::Field>);
type Table = BTreeMap<String, Row>;
type Tables = Arc<Mutex<BTreeMap<String, Table>>>;

pub struct FakeServer {
    pub addr: SocketAddr,
    tables: Tables,
    _accept: JoinHandle<()>,
}

impl FakeServer {
    pub fn start(behavior: Behavior) -> Self {
        Self::spawn(move |stream, tables| serve_connection(stream, behavior, tables))
    }

    /// Serve every call over TLS with a freshly generated self-signed certificate.
    pub fn start_tls() -> Self {
        let config = tls_server_config();
        Self::spawn(move |stream, tables| serve_tls(stream, Arc::clone(&config), tables))
    }

    fn spawn<F>(serve: F) -> Self
    where
        F: Fn(TcpStream, Tables) + Send + Sync + 'static,
    {
        let _ = env_logger::builder().is_test(true).try_init();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let tables: Tables = Arc::new(Mutex::new(BTreeMap::new()));

        let shared = Arc::clone(&tables);
        let serve = Arc::new(serve);
        let accept = thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let tables = Arc::clone(&shared);
                let serve = Arc::clone(&serve);
                thread::spawn(move || serve(stream, tables));
            }
        });

        Self {
            addr,
            tables,
            _accept: accept,
        }
    }

    /// Open a session straight onto the post-auth framing.
    pub fn session(&self) -> Session {
        self.session_with(SessionConfig::default())
    }

    pub fn session_with(&self, config: SessionConfig) -> Session {
        let sock = TcpStream::connect(self.addr).unwrap();
        Session::open(sock, &config).unwrap()
    }

    /// Complete a TLS handshake, then open a session over the encrypted stream.
    pub fn tls_session(&self) -> Session {
        let sock = TcpStream::connect(self.addr).unwrap();
        let client = tls::client_config(&TlsVerification::AcceptAny).unwrap();
        let stream = TlsStream::connect(sock, "localhost", client).unwrap();
        Session::open(stream, &SessionConfig::default()).unwrap()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, BTreeMap::len)
    }
}

fn tls_server_config() -> Arc<ServerConfig> {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![certified.cert.der().clone()], key)
        .unwrap();
    Arc::new(config)
}

/// Answer frames one at a time, in arrival order, over a server-side TLS stream.
fn serve_tls(sock: TcpStream, config: Arc<ServerConfig>, tables: Tables) {
    let Ok(conn) = ServerConnection::new(config) else {
        return;
    };
    let mut stream = StreamOwned::new(conn, sock);
    loop {
        let next = FrameReader::new(&mut stream, 1 << 24).read_frame();
        let Ok(Some(frame)) = next else { break };
        let reply = handle(&frame.payload, &tables);
        let bytes = encode_frame(frame.correlation_id, &reply).unwrap();
        if stream.write_all(&bytes).and_then(|()| stream.flush()).is_err() {
            break;
        }
    }
}

fn serve_connection(stream: TcpStream, behavior: Behavior, tables: Tables) {
    if behavior == Behavior::RejectAuth {
        let mut stream = stream;
        if read_preauth(&mut stream, 1 << 20).is_ok() {
            let _ = write_preauth(&mut stream, b"e=invalid-proof");
        }
        return;
    }

    let writer = Arc::new(Mutex::new(stream.try_clone().unwrap()));
    let mut reader = FrameReader::new(stream, 1 << 24);
    let mut workers = Vec::new();

    while let Ok(Some(frame)) = reader.read_frame() {
        match behavior {
            Behavior::HangUpAfterFirstCall => {
                let _ = writer.lock().shutdown(std::net::Shutdown::Both);
                return;
            }
            Behavior::Silent => continue,
            _ => {}
        }

        let writer = Arc::clone(&writer);
        let tables = Arc::clone(&tables);
        workers.push(thread::spawn(move || {
            let jitter = rand::thread_rng().gen_range(0..3);
            thread::sleep(Duration::from_millis(jitter));

            let reply = handle(&frame.payload, &tables);
            let bytes = encode_frame(frame.correlation_id, &reply).unwrap();
            let _ = writer.lock().write_all(&bytes);
        }));
    }

    for worker in workers {
        let _ = worker.join();
    }
}

fn handle(payload: &[u8], tables: &Mutex<BTreeMap<String, Table>>) -> Vec<u8> {
    let request = ApolloPdu::decode(payload).unwrap();
    let procedure = match request.procedure {
        Some(procedure) => dispatch(procedure, tables),
        None => error("protocol", "missing procedure"),
    };
    ApolloPdu {
        version: request.version,
        transaction_id: request.transaction_id,
        procedure: Some(procedure),
    }
    .encode_to_vec()
}

fn ok(reply: response::Reply) -> Procedure {
    Procedure::Response(apollo::Response {
        result: Some(reply),
    })
}

fn error(layer: &str, text: &str) -> Procedure {
    let mut err = apollo::Error::default();
    match layer {
        "protocol" => err.protocol = text.to_string(),
        "system" => err.system = text.to_string(),
        _ => err.misc = text.to_string(),
    }
    Procedure::Error(err)
}

/// Sort key for a row: the key fields rendered as a map.
fn row_key(key: &[apollo::Field]) -> String {
    Value::Map(decode_fields(key.to_vec())).to_string()
}

fn dispatch(procedure: Procedure, tables: &Mutex<BTreeMap<String, Table>>) -> Procedure {
    let mut tables = tables.lock();
    match procedure {
        Procedure::CreateTable(create) => {
            tables.entry(create.table_name).or_default();
            ok(response::Reply::Ok("ok".into()))
        }
        Procedure::ListTables(_) => ok(response::Reply::StringList(apollo::FieldNames {
            field_names: tables.keys().cloned().collect(),
        })),
        Procedure::Write(write) => {
            tables
                .entry(write.table_name)
                .or_default()
                .insert(row_key(&write.key), (write.key, write.columns));
            ok(response::Reply::Ok("ok".into()))
        }
        Procedure::Read(read) => {
            let row = tables
                .get(&read.table_name)
                .and_then(|table| table.get(&row_key(&read.key)));
            match row {
                Some((_, columns)) => ok(response::Reply::Columns(apollo::Fields {
                    fields: columns.clone(),
                })),
                None => error("system", "not_found"),
            }
        }
        Procedure::Delete(delete) => {
            if let Some(table) = tables.get_mut(&delete.table_name) {
                table.remove(&row_key(&delete.key));
            }
            ok(response::Reply::Ok("ok".into()))
        }
        Procedure::ReadRange(range) => {
            let Some(table) = tables.get(&range.table_name) else {
                return error("system", "no_table");
            };
            let (start, end) = (row_key(&range.start_key), row_key(&range.end_key));
            let mut rows = table.range(start..=end).map(|(_, row)| row);

            let list = rows
                .by_ref()
                .take(range.limit as usize)
                .map(|(key, columns)| apollo::KeyColumnsPair {
                    key: key.clone(),
                    columns: columns.clone(),
                })
                .collect();
            let continuation = match rows.next() {
                Some((key, _)) => apollo::ContinuationKey {
                    complete: false,
                    key: key.clone(),
                },
                None => apollo::ContinuationKey {
                    complete: true,
                    key: vec![],
                },
            };
            ok(response::Reply::KeyColumnsList(apollo::KeyColumnsList {
                list,
                continuation: Some(continuation),
            }))
        }
        Procedure::First(first) => {
            let Some((key, columns)) = tables
                .get(&first.table_name)
                .and_then(|table| table.values().next())
            else {
                return error("system", "empty_table");
            };
            ok(response::Reply::KcpIt(apollo::KcpIt {
                key_columns_pair: Some(apollo::KeyColumnsPair {
                    key: key.clone(),
                    columns: columns.clone(),
                }),
                it: row_key(key).into_bytes(),
            }))
        }
        _ => error("misc", "unsupported procedure"),
    }
}
