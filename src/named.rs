//! Named-parameter binding: `:name` placeholders rewritten to the backend's
//! positional form.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use sea_orm::{DbBackend, DbErr, Statement, Value};

/// A source of values for `:name` placeholders.
///
/// Implemented for maps and slices of pairs keyed by name. Implement it on
/// your own structs to pass them directly:
///
/// ```rust
/// use sea_orm::Value;
/// use traced_sea_orm::NamedArgs;
///
/// struct NewUser {
///     name: String,
///     age: i32,
/// }
///
/// impl NamedArgs for NewUser {
///     fn named_value(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(self.name.clone().into()),
///             "age" => Some(self.age.into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait NamedArgs {
    /// Value bound to `name`, or `None` if there is none.
    fn named_value(&self, name: &str) -> Option<Value>;
}

impl<T: NamedArgs + ?Sized> NamedArgs for &T {
    fn named_value(&self, name: &str) -> Option<Value> {
        (**self).named_value(name)
    }
}

impl<S: BuildHasher> NamedArgs for HashMap<String, Value, S> {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<S: BuildHasher> NamedArgs for HashMap<&str, Value, S> {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl NamedArgs for BTreeMap<String, Value> {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl NamedArgs for BTreeMap<&str, Value> {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl NamedArgs for [(&str, Value)] {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    }
}

impl<const N: usize> NamedArgs for [(&str, Value); N] {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.as_slice().named_value(name)
    }
}

impl NamedArgs for Vec<(&str, Value)> {
    fn named_value(&self, name: &str) -> Option<Value> {
        self.as_slice().named_value(name)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexer {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Rewrite `:name` placeholders in `sql` into positional placeholders for
/// `backend` and bind the matching values from `args` in order of appearance.
///
/// `$1, $2, ...` are produced for Postgres and `?` for MySQL and SQLite.
/// A `::` pair is copied as is, so Postgres casts keep working. Text inside
/// single quotes, double quotes and `--` comments is copied untouched. For
/// MySQL a backslash inside quotes escapes the next character.
pub fn compile<A>(backend: DbBackend, sql: &str, args: &A) -> Result<Statement, DbErr>
where
    A: NamedArgs + ?Sized,
{
    let mut rebound = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut lexer = Lexer::Code;
    let mut chars = sql.chars().peekable();
    let backslash_escapes = backend == DbBackend::MySql;

    while let Some(c) = chars.next() {
        match lexer {
            Lexer::SingleQuoted | Lexer::DoubleQuoted => {
                rebound.push(c);
                if c == '\\' && backslash_escapes {
                    if let Some(escaped) = chars.next() {
                        rebound.push(escaped);
                    }
                } else if (c == '\'' && lexer == Lexer::SingleQuoted)
                    || (c == '"' && lexer == Lexer::DoubleQuoted)
                {
                    lexer = Lexer::Code;
                }
            }
            Lexer::LineComment => {
                rebound.push(c);
                if c == '\n' {
                    lexer = Lexer::Code;
                }
            }
            Lexer::Code => match c {
                '\'' => {
                    rebound.push(c);
                    lexer = Lexer::SingleQuoted;
                }
                '"' => {
                    rebound.push(c);
                    lexer = Lexer::DoubleQuoted;
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    rebound.push_str("--");
                    lexer = Lexer::LineComment;
                }
                ':' if chars.peek() == Some(&':') => {
                    chars.next();
                    rebound.push_str("::");
                }
                ':' if chars.peek().copied().is_some_and(is_name_start) => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if !is_name_char(next) {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }

                    let value = args.named_value(&name).ok_or_else(|| {
                        DbErr::Custom(format!("could not find name {name} in named arguments"))
                    })?;
                    values.push(value);

                    match backend {
                        DbBackend::Postgres => {
                            rebound.push('$');
                            rebound.push_str(&values.len().to_string());
                        }
                        DbBackend::MySql | DbBackend::Sqlite => rebound.push('?'),
                    }
                }
                _ => rebound.push(c),
            },
        }
    }

    Ok(Statement::from_sql_and_values(backend, rebound, values))
}
