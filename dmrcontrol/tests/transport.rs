use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dmrcontrol::{HttpTransport, TransportError, UreqTransport};

/// Request as seen by the loopback server
struct Received {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Received {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn read_request(stream: &TcpStream) -> Received {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let is_chunked = headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("transfer-encoding") && v.eq_ignore_ascii_case("chunked")
    });
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok());

    let mut body = Vec::new();
    if is_chunked {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).unwrap();
            let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
            let mut chunk = vec![0u8; size + 2];
            reader.read_exact(&mut chunk).unwrap();
            if size == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    } else if let Some(length) = content_length {
        body.resize(length, 0);
        reader.read_exact(&mut body).unwrap();
    }

    Received {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8(body).unwrap(),
    }
}

/// Serves exactly one request with `status` and `body`, then hands the
/// request back.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let received = read_request(&stream);

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        received
    });

    (base, handle)
}

fn transport() -> UreqTransport {
    UreqTransport::new(Duration::from_secs(5), Duration::from_secs(5))
}

#[test]
fn test_get_returns_status_and_body() {
    let (base, server) = serve_once("200 OK", "<root/>");

    let response = transport().get(&format!("{}/desc.xml", base)).unwrap();
    let received = server.join().unwrap();

    assert_eq!(received.request_line, "GET /desc.xml HTTP/1.1");
    assert_eq!(response.status, 200);
    assert!(response.is_success());
    assert_eq!(response.body, b"<root/>");
}

#[test]
fn test_post_sends_headers_and_body() {
    let (base, server) = serve_once("200 OK", "<s:Envelope/>");

    let headers = [
        (
            "SOAPAction",
            "\"urn:schemas-upnp-org:service:ConnectionManager:1#GetProtocolInfo\"",
        ),
        ("Content-Type", "text/xml"),
        ("charset", "utf-8"),
        ("Connection", "close"),
    ];
    let payload = "<?xml version='1.0' encoding='utf-8'?><x/>";

    let response = transport()
        .post(&format!("{}/ctl/cm", base), &headers, payload)
        .unwrap();
    let received = server.join().unwrap();

    assert_eq!(received.request_line, "POST /ctl/cm HTTP/1.1");
    assert_eq!(
        received.header("soapaction"),
        Some("\"urn:schemas-upnp-org:service:ConnectionManager:1#GetProtocolInfo\"")
    );
    assert_eq!(received.header("content-type"), Some("text/xml"));
    assert_eq!(received.header("charset"), Some("utf-8"));
    assert_eq!(received.header("connection"), Some("close"));
    assert_eq!(received.body, payload);
    assert_eq!(response.body, b"<s:Envelope/>");
}

#[test]
fn test_error_status_is_not_a_transport_error() {
    let fault = "<s:Fault><faultcode>s:Client</faultcode></s:Fault>";
    let (base, server) = serve_once("500 Internal Server Error", fault);

    let response = transport()
        .post(&format!("{}/ctl/cm", base), &[], "<x/>")
        .unwrap();
    server.join().unwrap();

    assert_eq!(response.status, 500);
    assert!(!response.is_success());
    assert_eq!(response.body, fault.as_bytes());
}

#[test]
fn test_zero_timeout_means_no_timeout() {
    let (base, server) = serve_once("200 OK", "<root/>");

    let transport = UreqTransport::new(Duration::ZERO, Duration::ZERO);
    let response = transport.get(&format!("{}/desc.xml", base)).unwrap();
    server.join().unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"<root/>");
}

#[test]
fn test_connection_refused() {
    // grab a free port, then close it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = transport().get(&format!("http://127.0.0.1:{}/desc.xml", port));
    assert!(matches!(result, Err(TransportError::Http(_))));
}
