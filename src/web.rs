//! Minimal web form wrapping the extract → generate pipeline.
//!
//! Two routes, one worker, no shared mutable state:
//!
//! * `GET /` renders the connection form.
//! * `POST /generate` validates the form, connects, extracts, generates and
//!   returns the file as an attachment. Validation and connection failures
//!   re-render the form with a 400 and a human-readable error; the password
//!   is never echoed back.

use may_minihttp::{HttpServer, HttpService, Request, Response};
use std::io::{self, Read};

use crate::config::DbConfig;
use crate::extractor::extract_schema;
use crate::generator::{generate, Platform};

const FORM_STYLE: &str = "\
    body { font-family: sans-serif; max-width: 640px; margin: 40px auto; padding: 0 16px; }\n\
    h1   { font-size: 1.4rem; }\n\
    label { display: block; margin-top: 12px; font-weight: bold; }\n\
    input, select { width: 100%; padding: 6px; margin-top: 4px; box-sizing: border-box; }\n\
    input[type=submit] { margin-top: 20px; background: #0070f3; color: #fff;\n\
                         border: none; padding: 10px; cursor: pointer; font-size: 1rem; }\n\
    .error { color: #c00; background: #fee; padding: 10px; margin-top: 12px; border-radius: 4px; }\n\
    fieldset { border: 1px solid #ccc; padding: 12px; margin-top: 16px; }\n\
    legend   { font-weight: bold; }";

/// Form state used to re-render after an error
#[derive(Debug, Clone)]
pub struct FormState {
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub user: String,
    pub schema_filter: String,
    pub platform: String,
}

impl Default for FormState {
    fn default() -> Self {
        FormState {
            host: "localhost".to_string(),
            port: "5432".to_string(),
            dbname: "my_gis_db".to_string(),
            user: "postgres".to_string(),
            schema_filter: String::new(),
            platform: "pyqgis".to_string(),
        }
    }
}

/// Render the connection form, optionally with an error banner.
pub fn render_form(state: &FormState, error: Option<&str>) -> String {
    let error_div = match error {
        Some(msg) => format!("\n  <div class=\"error\">{}</div>\n", html_escape(msg)),
        None => String::new(),
    };
    let platform_options: String = Platform::ALL
        .iter()
        .map(|p| {
            let selected = if p.as_str() == state.platform {
                " selected"
            } else {
                ""
            };
            format!("          <option value=\"{p}\"{selected}>{p}</option>\n")
        })
        .collect();

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>GIS Script Generator</title>
  <style>
{FORM_STYLE}
  </style>
</head>
<body>
  <h1>GIS Script Generator</h1>
{error_div}
  <form method="post" action="/generate">
    <fieldset>
      <legend>Database connection</legend>
      <label>Host
        <input name="host" value="{host}" placeholder="localhost">
      </label>
      <label>Port
        <input name="port" value="{port}" placeholder="5432">
      </label>
      <label>Database
        <input name="dbname" value="{dbname}" placeholder="my_gis_db">
      </label>
      <label>User
        <input name="user" value="{user}" placeholder="postgres">
      </label>
      <label>Password
        <input name="password" type="password">
      </label>
    </fieldset>

    <fieldset>
      <legend>Generation options</legend>
      <label>Platform
        <select name="platform">
{platform_options}        </select>
      </label>
      <label>Schema filter (optional)
        <input name="schema_filter" value="{schema_filter}" placeholder="public">
      </label>
    </fieldset>

    <input type="submit" value="Connect &amp; Generate">
  </form>
</body>
</html>"#,
        host = html_escape(&state.host),
        port = html_escape(&state.port),
        dbname = html_escape(&state.dbname),
        user = html_escape(&state.user),
        schema_filter = html_escape(&state.schema_filter),
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Decode one `application/x-www-form-urlencoded` value
fn url_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = &value[i + 1..i + 3];
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse an urlencoded form body into key/value pairs
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (url_decode(key), url_decode(value)),
            None => (url_decode(pair), String::new()),
        })
        .collect()
}

fn form_value<'a>(fields: &'a [(String, String)], key: &str) -> &'a str {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

#[derive(Clone)]
pub struct GeneratorService;

impl GeneratorService {
    fn handle_generate(&self, body: &str, res: &mut Response) {
        let fields = parse_form(body);
        let state = FormState {
            host: or_default(form_value(&fields, "host"), "localhost"),
            port: or_default(form_value(&fields, "port"), "5432"),
            dbname: or_default(form_value(&fields, "dbname"), "my_gis_db"),
            user: or_default(form_value(&fields, "user"), "postgres"),
            schema_filter: form_value(&fields, "schema_filter").trim().to_string(),
            platform: or_default(form_value(&fields, "platform"), "pyqgis"),
        };
        let password = form_value(&fields, "password").trim().to_string();

        let port: u16 = match state.port.parse() {
            Ok(p) => p,
            Err(_) => {
                return bad_request(res, &state, "Port must be an integer.");
            }
        };

        let platform: Platform = match state.platform.parse() {
            Ok(p) => p,
            Err(_) => {
                let message = format!("Unknown platform: {}", state.platform);
                return bad_request(res, &state, &message);
            }
        };

        let db = DbConfig {
            host: state.host.clone(),
            port,
            dbname: state.dbname.clone(),
            user: state.user.clone(),
            password,
        };

        let schema = match crate::connection::connect(&db)
            .and_then(|client| extract_schema(&client, &db, true))
        {
            Ok(schema) => schema,
            Err(e) => {
                let message = format!("Connection error: {e}");
                return bad_request(res, &state, &message);
            }
        };

        let schema = if state.schema_filter.is_empty() {
            schema
        } else {
            schema.retain_schema(&state.schema_filter)
        };

        let code = generate(platform, &schema, &db, &[], None, None);
        let filename = format!("{}_{platform}{}", state.dbname, platform.extension());

        res.header("Content-Type: text/plain; charset=utf-8");
        // header() takes 'static; the per-request disposition string must
        // outlive the response
        let disposition: &'static str = Box::leak(
            format!("Content-Disposition: attachment; filename=\"{filename}\"").into_boxed_str(),
        );
        res.header(disposition);
        res.body_mut().extend_from_slice(code.as_bytes());
    }
}

fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn bad_request(res: &mut Response, state: &FormState, message: &str) {
    log::warn!("generate request rejected: {message}");
    res.status_code(400, "Bad Request");
    res.header("Content-Type: text/html; charset=utf-8");
    let html = render_form(state, Some(message));
    res.body_mut().extend_from_slice(html.as_bytes());
}

impl HttpService for GeneratorService {
    fn call(&mut self, mut req: Request, res: &mut Response) -> io::Result<()> {
        match (req.method(), req.path()) {
            ("GET", "/") => {
                res.header("Content-Type: text/html; charset=utf-8");
                let html = render_form(&FormState::default(), None);
                res.body_mut().extend_from_slice(html.as_bytes());
            }
            ("POST", "/generate") => {
                let mut body = Vec::new();
                let mut reader = req.body();
                reader.read_to_end(&mut body)?;
                let body = String::from_utf8_lossy(&body).into_owned();
                self.handle_generate(&body, res);
            }
            _ => {
                res.status_code(404, "Not Found");
            }
        }
        Ok(())
    }
}

/// Start the form server and block until it exits.
pub fn run(addr: &str) -> io::Result<()> {
    let server = HttpServer(GeneratorService)
        .start(addr)
        .map_err(|e| io::Error::other(format!("Failed to start server: {e}")))?;
    log::info!("GIS Script Generator UI listening on http://{addr}/");
    server
        .join()
        .map_err(|e| io::Error::other(format!("Server error: {e:?}")))?;
    Ok(())
}
