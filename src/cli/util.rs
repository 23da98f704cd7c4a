use crate::errors::QueryError;
use crate::query::RawQuery;

/// Splits `key=value` at the first `=`; a pair without `=` has an empty value.
pub fn parse_param(s: &str) -> Result<(String, String), QueryError> {
    let (k, v) = s.split_once('=').unwrap_or((s, ""));
    let k = k.trim();
    if k.is_empty() {
        return Err(QueryError::InvalidData(format!("parameter `{s}` has no key")));
    }
    Ok((k.to_string(), v.to_string()))
}

pub fn raw_query(params: &[String]) -> Result<RawQuery, QueryError> {
    params.iter().map(|p| parse_param(p)).collect::<Result<Vec<_>, _>>().map(RawQuery::from_pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_parsing() {
        assert_eq!(parse_param("averageCost[lte]=10000").unwrap(), ("averageCost[lte]".into(), "10000".into()));
        assert_eq!(parse_param("title=a=b").unwrap(), ("title".into(), "a=b".into()));
        assert_eq!(parse_param("housing").unwrap(), ("housing".into(), String::new()));
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn later_params_win() {
        let raw = raw_query(&["page=1".into(), "page=3".into()]).unwrap();
        assert_eq!(raw.get("page"), Some("3"));
    }
}
