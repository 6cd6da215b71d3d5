use crate::{
    config::{DEFAULT_MYSQL_HOST, DriverKind, HopperConfig},
    driver::{RowCursor, SqlDriver},
    parameters::validate_identifier,
    result::DriverError,
    shaping::Row,
};
use mysql::prelude::{Protocol, Queryable};
use mysql::{ClientIdentity, Conn, Opts, OptsBuilder, Params, QueryResult, SslOpts, Value as MysqlValue};
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Convert a JSON scalar into a MySQL protocol value
pub fn json_to_mysql(value: &Value) -> MysqlValue {
    match value {
        Value::Null => MysqlValue::NULL,
        Value::Bool(b) => MysqlValue::Int(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                MysqlValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                MysqlValue::UInt(u)
            } else {
                MysqlValue::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => MysqlValue::Bytes(s.clone().into_bytes()),
        other => MysqlValue::Bytes(other.to_string().into_bytes()),
    }
}

/// Convert a MySQL column value into JSON.
/// Temporal values render as `YYYY-MM-DD HH:MM:SS` and `[-]HHH:MM:SS` strings.
pub fn mysql_to_json(value: &MysqlValue) -> Value {
    match value {
        MysqlValue::NULL => Value::Null,
        MysqlValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::String(text.to_string()),
            Err(_) => Value::Array(bytes.iter().map(|&byte| Value::Number(byte.into())).collect()),
        },
        MysqlValue::Int(i) => Value::Number((*i).into()),
        MysqlValue::UInt(u) => Value::Number((*u).into()),
        MysqlValue::Float(f) => Value::from(f64::from(*f)),
        MysqlValue::Double(d) => Value::from(*d),
        MysqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}");
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::String(text)
        }
        MysqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            let mut text = format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Value::String(text)
        }
    }
}

/// Build client options from the `hostname`, `port`, `database`, credential,
/// `charset` and `tls` settings
pub fn connect_options(config: &HopperConfig) -> Result<Opts, DriverError> {
    let mut builder = OptsBuilder::new()
        .ip_or_hostname(Some(config.hostname.as_deref().unwrap_or(DEFAULT_MYSQL_HOST)))
        .tcp_port(config.port.unwrap_or(DEFAULT_MYSQL_PORT))
        .db_name(config.database.as_deref())
        .user(config.username.as_deref())
        .pass(config.password.as_deref());

    if let Some(charset) = config.charset.as_deref() {
        validate_identifier(charset).map_err(|err| DriverError::new(err.to_string()))?;
        builder = builder.init(vec![format!("SET NAMES {charset}")]);
    }

    if let Some(tls) = &config.tls {
        let mut ssl = SslOpts::default().with_root_cert_path(tls.ca.as_deref().map(PathBuf::from));
        match (tls.cert.as_deref(), tls.key.as_deref()) {
            (Some(cert), Some(key)) => {
                ssl = ssl.with_client_identity(Some(ClientIdentity::new(
                    PathBuf::from(cert),
                    PathBuf::from(key),
                )));
            }
            (None, None) => {}
            _ => {
                return Err(DriverError::new(
                    "tls 'cert' and 'key' must be configured together",
                ));
            }
        }
        builder = builder.ssl_opts(Some(ssl));
    }

    Ok(Opts::from(builder))
}

fn read_result<P: Protocol>(mut result: QueryResult<'_, '_, '_, P>) -> Result<RowCursor, DriverError> {
    let columns: Vec<String> = result
        .columns()
        .as_ref()
        .iter()
        .map(|column| column.name_str().into_owned())
        .collect();
    let affected = result.affected_rows();

    if columns.is_empty() {
        return Ok(RowCursor::affected(affected));
    }

    let mut result_rows = Vec::new();
    for row in result.by_ref() {
        let row = row?;
        let mut obj = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            let value = row.as_ref(idx).map(mysql_to_json).unwrap_or(Value::Null);
            obj.insert(name.clone(), value);
        }
        result_rows.push(obj);
    }
    Ok(RowCursor::with_rows(columns, result_rows))
}

/// [`SqlDriver`] backed by a blocking MySQL client connection
pub struct MysqlDriver {
    conn: Conn,
}

impl MysqlDriver {
    pub fn new(conn: Conn) -> Self {
        MysqlDriver { conn }
    }

    /// Open a connection described by `config`
    pub fn connect(config: &HopperConfig) -> Result<Self, DriverError> {
        let opts = connect_options(config)?;
        Ok(Self::new(Conn::new(opts)?))
    }

    pub fn connection_mut(&mut self) -> &mut Conn {
        &mut self.conn
    }
}

impl SqlDriver for MysqlDriver {
    fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> Result<RowCursor, DriverError> {
        let params = if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params.iter().map(json_to_mysql).collect())
        };
        let result = self.conn.exec_iter(sql, params)?;
        read_result(result)
    }

    fn execute_direct(&mut self, sql: &str) -> Result<RowCursor, DriverError> {
        let result = self.conn.query_iter(sql)?;
        read_result(result)
    }

    fn last_insert_id(&self) -> i64 {
        i64::try_from(self.conn.last_insert_id()).unwrap_or(i64::MAX)
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Mysql
    }
}
