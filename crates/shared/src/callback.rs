//! Button payloads that carry a wizard's whole state.
//!
//! Layout is `\x0c<unique>` or `\x0c<unique>|<arg>|<arg>...`. Inside arguments
//! `\` becomes `\\` and `|` becomes `\|`, so plain values encode the same as a
//! bare join.

pub const MAX_CALLBACK_DATA: usize = 64;

const PREFIX: char = '\u{c}';
const DELIMITER: char = '|';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("callback data is {0} bytes, limit is {MAX_CALLBACK_DATA}")]
    TooLong(usize),

    #[error("callback data has no handler prefix")]
    MissingPrefix,

    #[error("callback data ends with a dangling escape")]
    DanglingEscape,

    #[error("handler `{0}` contains a reserved character")]
    InvalidUnique(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Callback {
    pub unique: String,
    pub args: Vec<String>,
}

impl Callback {
    pub fn new(unique: impl Into<String>) -> Self {
        Self {
            unique: unique.into(),
            args: vec![],
        }
    }

    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(values.into_iter().map(|v| v.to_string()));
        self
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn encode(&self) -> Result<String, CallbackError> {
        if self.unique.contains([DELIMITER, ESCAPE, PREFIX]) {
            return Err(CallbackError::InvalidUnique(self.unique.clone()));
        }

        let mut data = String::with_capacity(MAX_CALLBACK_DATA);
        data.push(PREFIX);
        data.push_str(&self.unique);
        for arg in &self.args {
            data.push(DELIMITER);
            escape_into(arg, &mut data);
        }

        if data.len() > MAX_CALLBACK_DATA {
            return Err(CallbackError::TooLong(data.len()));
        }

        Ok(data)
    }

    pub fn decode(data: &str) -> Result<Self, CallbackError> {
        if data.len() > MAX_CALLBACK_DATA {
            return Err(CallbackError::TooLong(data.len()));
        }

        let body = data
            .strip_prefix(PREFIX)
            .ok_or(CallbackError::MissingPrefix)?;

        let Some((unique, rest)) = body.split_once(DELIMITER) else {
            return Ok(Self::new(body));
        };

        Ok(Self {
            unique: unique.to_owned(),
            args: split_args(rest)?,
        })
    }
}

fn escape_into(arg: &str, out: &mut String) {
    for c in arg.chars() {
        if c == DELIMITER || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

fn split_args(data: &str) -> Result<Vec<String>, CallbackError> {
    let mut args = vec![];
    let mut current = String::new();
    let mut chars = data.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => current.push(chars.next().ok_or(CallbackError::DanglingEscape)?),
            DELIMITER => args.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    args.push(current);

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_arguments_match_a_bare_join() {
        let data = Callback::new("registration")
            .args(["108", "1", "64"])
            .encode()
            .unwrap();

        assert_eq!(data, "\u{c}registration|108|1|64");
    }

    #[test]
    fn no_args_and_one_empty_arg_are_distinct() {
        let bare = Callback::new("plate").encode().unwrap();
        let empty = Callback::new("plate").arg("").encode().unwrap();

        assert_eq!(Callback::decode(&bare).unwrap().args, Vec::<String>::new());
        assert_eq!(Callback::decode(&empty).unwrap().args, vec![String::new()]);
    }

    #[test]
    fn delimiter_inside_an_argument_survives() {
        let callback = Callback::new("registration").args(["7|A", r"c:\x", "3"]);
        let data = callback.encode().unwrap();

        assert_eq!(data, "\u{c}registration|7\\|A|c:\\\\x|3");
        assert_eq!(Callback::decode(&data).unwrap(), callback);
    }

    #[test]
    fn payload_over_limit_is_rejected() {
        let err = Callback::new("registration")
            .arg("x".repeat(MAX_CALLBACK_DATA))
            .encode()
            .unwrap_err();

        assert!(matches!(err, CallbackError::TooLong(_)));
    }

    #[test]
    fn limit_counts_bytes_not_characters() {
        let unique = "u";
        let room = MAX_CALLBACK_DATA - 1 - unique.len() - 1;
        let fits = Callback::new(unique).arg("a".repeat(room));
        let overflows = Callback::new(unique).arg("ж".repeat(room / 2 + 1));

        assert!(fits.encode().is_ok());
        assert!(overflows.encode().is_err());
    }

    #[test]
    fn reserved_characters_in_unique_are_rejected() {
        assert!(matches!(
            Callback::new("a|b").encode(),
            Err(CallbackError::InvalidUnique(_))
        ));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert_eq!(
            Callback::decode("registration|1").unwrap_err(),
            CallbackError::MissingPrefix
        );
        assert_eq!(
            Callback::decode("\u{c}registration|1\\").unwrap_err(),
            CallbackError::DanglingEscape
        );
    }
}
