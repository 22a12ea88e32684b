// ── Connection config resolution ──
//
// Pure mapping from add-form input to the backend add payload. The
// simple variant is chosen iff every SSH option is textually equal to
// its default; numeric options are only parsed for the advanced variant.

use crate::error::CoreError;
use crate::model::{ConnectionConfig, DeviceDraft, ResolvedAdd, SimpleAdd};

/// Resolve a draft into the payload of one of the two add commands.
///
/// Fails with [`CoreError::Validation`] on a missing name or address, or
/// on a port / timeout that is not a number. Empty numeric text means
/// "let the backend decide" and resolves to `None`.
pub fn resolve(draft: &DeviceDraft) -> Result<ResolvedAdd, CoreError> {
    let hostname = required("name", &draft.name)?;
    let ip = required("ip", &draft.ip)?;

    if draft.uses_default_ssh_options() {
        return Ok(ResolvedAdd::Simple(SimpleAdd { hostname, ip }));
    }

    let username = match draft.username.trim() {
        "" => None,
        name => Some(name.to_owned()),
    };

    Ok(ResolvedAdd::Advanced(ConnectionConfig {
        hostname,
        ip,
        username,
        port: parse_port(&draft.port)?,
        strict_host_key_checking: draft.strict_host_key_checking,
        connect_timeout: parse_timeout(&draft.connect_timeout)?,
    }))
}

fn required(field: &str, value: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(field, "is required"));
    }
    Ok(value.to_owned())
}

fn parse_port(text: &str) -> Result<Option<u16>, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<u16>() {
        Ok(0) => Err(CoreError::validation("port", "must be between 1 and 65535")),
        Ok(port) => Ok(Some(port)),
        Err(_) if text.bytes().all(|b| b.is_ascii_digit()) => {
            Err(CoreError::validation("port", "must be between 1 and 65535"))
        }
        Err(_) => Err(CoreError::validation(
            "port",
            format!("'{text}' is not a number"),
        )),
    }
}

fn parse_timeout(text: &str) -> Result<Option<u64>, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u64>().map(Some).map_err(|_| {
        CoreError::validation("connect timeout", format!("'{text}' is not a number of seconds"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AddVariant;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn draft(name: &str, ip: &str) -> DeviceDraft {
        DeviceDraft::new(name, ip)
    }

    #[test]
    fn defaults_resolve_to_simple() {
        let resolved = resolve(&draft("srv1", "10.0.0.5")).expect("valid draft");
        assert_eq!(resolved.variant(), AddVariant::Simple);
        assert_eq!(
            serde_json::to_value(&resolved).ok(),
            Some(json!({
                "variant": "simple",
                "payload": { "hostname": "srv1", "ip": "10.0.0.5" }
            }))
        );
    }

    #[test]
    fn custom_port_resolves_to_advanced() {
        let mut d = draft("srv2", "10.0.0.6");
        d.port = "2222".into();

        let resolved = resolve(&d).expect("valid draft");
        let ResolvedAdd::Advanced(config) = &resolved else {
            panic!("expected advanced, got {resolved:?}");
        };
        assert_eq!(config.port, Some(2222));
        assert_eq!(config.username, None);
        assert_eq!(config.connect_timeout, Some(30));
        assert!(config.strict_host_key_checking);

        let payload = serde_json::to_value(&resolved).expect("serializable");
        assert_eq!(payload["payload"]["port"], json!(2222));
        assert_eq!(payload["payload"]["username"], json!(null));
    }

    #[test]
    fn every_single_deviation_selects_advanced() {
        let changes: [fn(&mut DeviceDraft); 4] = [
            |d| d.username = "root".into(),
            |d| d.port = "2200".into(),
            |d| d.strict_host_key_checking = false,
            |d| d.connect_timeout = "5".into(),
        ];
        for change in changes {
            let mut d = draft("srv", "10.0.0.1");
            change(&mut d);
            let resolved = resolve(&d).expect("valid draft");
            assert_eq!(resolved.variant(), AddVariant::Advanced, "draft: {d:?}");
        }
    }

    #[test]
    fn restoring_defaults_returns_to_simple() {
        let mut d = draft("srv", "10.0.0.1");
        d.username = "root".into();
        d.strict_host_key_checking = false;
        assert_eq!(resolve(&d).map(|r| r.variant()), Ok(AddVariant::Advanced));

        d.username = String::new();
        d.strict_host_key_checking = true;
        assert_eq!(resolve(&d).map(|r| r.variant()), Ok(AddVariant::Simple));
    }

    #[test]
    fn default_detection_is_textual() {
        let mut d = draft("srv", "10.0.0.1");
        d.port = "022".into();
        let resolved = resolve(&d).expect("valid draft");
        assert_eq!(resolved.variant(), AddVariant::Advanced);
        assert_eq!(resolved.effective_connection().port, Some(22));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let mut d = draft("srv", "10.0.0.1");
        d.port = "ssh".into();
        assert!(matches!(
            resolve(&d),
            Err(CoreError::Validation { ref field, .. }) if field == "port"
        ));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        for port in ["0", "65536", "99999999999"] {
            let mut d = draft("srv", "10.0.0.1");
            d.port = port.into();
            assert!(resolve(&d).is_err(), "port {port} accepted");
        }
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let mut d = draft("srv", "10.0.0.1");
        d.connect_timeout = "soon".into();
        assert!(matches!(
            resolve(&d),
            Err(CoreError::Validation { ref field, .. }) if field == "connect timeout"
        ));
    }

    #[test]
    fn numeric_fields_left_unparsed_for_simple() {
        // Defaults are never parsed, so there is nothing to reject.
        let resolved = resolve(&draft("srv", "10.0.0.1")).expect("valid draft");
        assert_eq!(resolved.variant(), AddVariant::Simple);
    }

    #[test]
    fn empty_numeric_text_means_backend_default() {
        let mut d = draft("srv", "10.0.0.1");
        d.port = String::new();
        d.connect_timeout = String::new();
        let ResolvedAdd::Advanced(config) = resolve(&d).expect("valid draft") else {
            panic!("expected advanced");
        };
        assert_eq!(config.port, None);
        assert_eq!(config.connect_timeout, None);
    }

    #[test]
    fn name_and_ip_are_required() {
        assert!(matches!(
            resolve(&draft("", "10.0.0.1")),
            Err(CoreError::Validation { ref field, .. }) if field == "name"
        ));
        assert!(matches!(
            resolve(&draft("srv", "   ")),
            Err(CoreError::Validation { ref field, .. }) if field == "ip"
        ));
    }
}
