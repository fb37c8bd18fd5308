use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::{Error as XmlError, Reader};

use super::{DeviceDescription, ParseError, ServiceEntry};

const FRIENDLY_NAME_PATH: [&str; 3] = ["root", "device", "friendlyName"];
const SERVICE_PATH: [&str; 4] = ["root", "device", "serviceList", "service"];

pub(super) fn parse_description(xml: &str) -> Result<DeviceDescription, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut parsed = DeviceDescription::default();
    // Local names of the currently open elements, outermost first
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut current_service: Option<ServiceEntry> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                seen_root = true;
                text.clear();
                if at_path(&stack, &SERVICE_PATH) {
                    current_service = Some(ServiceEntry::default());
                }
            }
            Event::Empty(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                seen_root = true;
                text.clear();
                if at_path(&stack, &SERVICE_PATH) {
                    current_service = Some(ServiceEntry::default());
                }
                close_element(&stack, &text, &mut current_service, &mut parsed);
                stack.pop();
            }
            Event::End(_) => {
                close_element(&stack, &text, &mut current_service, &mut parsed);
                stack.pop();
                text.clear();
            }
            Event::Text(e) => {
                text.push_str(&e.decode().map_err(XmlError::Encoding)?);
            }
            Event::CData(e) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::GeneralRef(e) => {
                if let Some(ch) = e.resolve_char_ref()? {
                    text.push(ch);
                } else {
                    let name = e.decode().map_err(XmlError::Encoding)?;
                    match resolve_predefined_entity(&name) {
                        Some(value) => text.push_str(value),
                        None => {
                            text.push('&');
                            text.push_str(&name);
                            text.push(';');
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(ParseError::Malformed("no root element".to_string()));
    }
    if let Some(open) = stack.last() {
        return Err(ParseError::Malformed(format!(
            "document ends inside <{}>",
            open
        )));
    }

    Ok(parsed)
}

fn close_element(
    stack: &[String],
    text: &str,
    current_service: &mut Option<ServiceEntry>,
    parsed: &mut DeviceDescription,
) {
    let value = text.trim();

    if at_path(stack, &FRIENDLY_NAME_PATH) {
        if !value.is_empty() {
            parsed.friendly_name = Some(value.to_string());
        }
    } else if at_path(stack, &SERVICE_PATH) {
        if let Some(service) = current_service.take() {
            parsed.services.push(service);
        }
    } else if stack.len() == SERVICE_PATH.len() + 1
        && at_path(&stack[..SERVICE_PATH.len()], &SERVICE_PATH)
    {
        if let Some(service) = current_service.as_mut() {
            match stack[SERVICE_PATH.len()].as_str() {
                "serviceType" => service.service_type = value.to_string(),
                "serviceId" => service.service_id = value.to_string(),
                "controlURL" => service.control_url = value.to_string(),
                _ => {}
            }
        }
    }
}

fn at_path(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(open, want)| open == want)
}
