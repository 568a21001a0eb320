//! SMTP command and reply parsers.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::{Address, Reply, ReplyCode};

/// Parses one command line (without the trailing CRLF).
///
/// Verbs and parameter keywords are case-insensitive.
///
/// # Errors
///
/// Returns [`Error::UnknownCommand`] for an unrecognized verb,
/// [`Error::Syntax`] for malformed arguments, [`Error::InvalidAddress`] for a
/// bad path and [`Error::UnsupportedParameter`] for an unknown MAIL or RCPT
/// parameter.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, args) = line
        .split_once(' ')
        .map_or((line, ""), |(verb, args)| (verb, args.trim()));

    match verb.to_ascii_uppercase().as_str() {
        "HELO" => Ok(Command::Helo {
            hostname: required(args, "HELO hostname")?,
        }),
        "EHLO" => Ok(Command::Ehlo {
            hostname: required(args, "EHLO hostname")?,
        }),
        "MAIL" => parse_mail(args),
        "RCPT" => parse_rcpt(args),
        "DATA" => no_argument(args, "DATA", Command::Data),
        "RSET" => no_argument(args, "RSET", Command::Rset),
        "QUIT" => no_argument(args, "QUIT", Command::Quit),
        // NOOP may carry a string, which is ignored
        "NOOP" => Ok(Command::Noop),
        "VRFY" => Ok(Command::Vrfy {
            address: required(args, "VRFY <address>")?,
        }),
        _ => Err(Error::UnknownCommand(verb.to_string())),
    }
}

fn required(args: &str, usage: &str) -> Result<String> {
    if args.is_empty() {
        return Err(Error::Syntax(usage.to_string()));
    }
    Ok(args.to_string())
}

fn no_argument(args: &str, usage: &str, command: Command) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(Error::Syntax(usage.to_string()))
    }
}

fn parse_mail(args: &str) -> Result<Command> {
    const USAGE: &str = "MAIL FROM:<address>";

    let rest = strip_keyword(args, "FROM:").ok_or_else(|| Error::Syntax(USAGE.into()))?;
    let (path, params) = split_path(rest.trim_start());
    if path.is_empty() {
        return Err(Error::Syntax(USAGE.into()));
    }
    let from = Address::parse_path(path)?;

    let mut body = None;
    let mut size = None;
    let mut smtputf8 = false;

    for param in params.split_whitespace() {
        let (key, value) = param
            .split_once('=')
            .map_or((param, None), |(key, value)| (key, Some(value)));

        match (key.to_ascii_uppercase().as_str(), value) {
            ("SIZE", Some(value)) => {
                size = Some(
                    value
                        .parse()
                        .map_err(|_| Error::Syntax("SIZE=<bytes>".into()))?,
                );
            }
            ("BODY", Some(value)) => {
                let value = value.to_ascii_uppercase();
                if value != "7BIT" && value != "8BITMIME" {
                    return Err(Error::Syntax("BODY=7BIT|8BITMIME".into()));
                }
                body = Some(value);
            }
            ("SMTPUTF8", None) => smtputf8 = true,
            _ => return Err(Error::UnsupportedParameter(param.to_string())),
        }
    }

    Ok(Command::MailFrom {
        from,
        body,
        size,
        smtputf8,
    })
}

fn parse_rcpt(args: &str) -> Result<Command> {
    const USAGE: &str = "RCPT TO:<address>";

    let rest = strip_keyword(args, "TO:").ok_or_else(|| Error::Syntax(USAGE.into()))?;
    let (path, params) = split_path(rest.trim_start());
    if path.is_empty() {
        return Err(Error::Syntax(USAGE.into()));
    }
    if let Some(param) = params.split_whitespace().next() {
        return Err(Error::UnsupportedParameter(param.to_string()));
    }

    let to = Address::parse_path(path)?
        .ok_or_else(|| Error::InvalidAddress("Null path is not a recipient".into()))?;

    Ok(Command::RcptTo { to })
}

/// Strips a case-insensitive keyword prefix.
fn strip_keyword<'a>(args: &'a str, keyword: &str) -> Option<&'a str> {
    let head = args.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &args[keyword.len()..])
}

/// Splits `<path> params` or `path params`.
fn split_path(rest: &str) -> (&str, &str) {
    if rest.starts_with('<') {
        return match rest.find('>') {
            Some(end) => (&rest[..=end], rest[end + 1..].trim()),
            None => (rest, ""),
        };
    }
    rest.split_once(char::is_whitespace)
        .map_or((rest, ""), |(path, params)| (path, params.trim()))
}

/// Parses an SMTP reply from response lines.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Syntax("Empty reply".into()));
    };

    let code = first
        .get(0..3)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| Error::Syntax(format!("Invalid reply code: {first}")))?;

    let mut message = Vec::new();
    for line in lines {
        match line.get(4..) {
            Some(text) if line.len() > 4 => message.push(text.to_string()),
            _ if line.len() == 3 => message.push(String::new()),
            _ => return Err(Error::Syntax(format!("Malformed reply line: {line}"))),
        }
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Multi-line replies use `-` separator for continuation and ` ` for the last line.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() >= 4 && line.as_bytes()[3] == b' '
}
