use std::collections::HashMap;

/// Kind of a declared command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Boolean,
}

/// One declared parameter of a command.
///
/// A parameter is matched in the input as either `--<name>` or `-<first char
/// of name>`. Short-flag collisions between parameters of one command are
/// rejected when the command is registered.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub name: &'static str,
}

impl ParamSpec {
    pub const fn string(name: &'static str) -> Self {
        ParamSpec {
            kind: ParamKind::String,
            name,
        }
    }

    pub const fn boolean(name: &'static str) -> Self {
        ParamSpec {
            kind: ParamKind::Boolean,
            name,
        }
    }

    pub fn long_flag(&self) -> String {
        format!("--{}", self.name)
    }

    pub fn short_flag(&self) -> Option<String> {
        self.name.chars().next().map(|c| format!("-{c}"))
    }
}

/// Value of a parsed parameter. Every declared parameter has a value after
/// parsing; absent flags hold their kind's zero value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Bool(bool),
}

/// Result of parsing one input against one parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedArgs {
    /// Tokens left over after consuming recognized flags, in input order.
    pub remaining: Vec<String>,
    pub values: HashMap<String, ParamValue>,
}

impl ParsedArgs {
    /// String parameter by name; `""` when absent or not a string.
    pub fn string(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(ParamValue::Str(s)) => s,
            _ => "",
        }
    }

    /// Boolean parameter by name; `false` when absent or not a boolean.
    pub fn boolean(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ParamValue::Bool(true)))
    }
}

/// Parse pre-split tokens against a parameter schema.
///
/// Pure function: schema entries are visited in declaration order, tokens
/// left to right, so identical inputs always produce identical output.
/// Unrecognized `--x` / `-x` tokens pass through untouched so older clients
/// can send flags a command does not know yet.
pub fn parse(tokens: &[String], schema: &[ParamSpec]) -> ParsedArgs {
    let mut remaining: Vec<String> = tokens.to_vec();
    let mut values = HashMap::with_capacity(schema.len());

    for spec in schema {
        let zero = match spec.kind {
            ParamKind::String => ParamValue::Str(String::new()),
            ParamKind::Boolean => ParamValue::Bool(false),
        };
        values.insert(spec.name.to_string(), zero);
    }

    for spec in schema {
        let long = spec.long_flag();
        let short = spec.short_flag();

        let position = remaining
            .iter()
            .position(|token| *token == long || Some(token) == short.as_ref());

        let Some(position) = position else {
            continue;
        };

        match spec.kind {
            ParamKind::Boolean => {
                remaining.remove(position);
                values.insert(spec.name.to_string(), ParamValue::Bool(true));
            }
            ParamKind::String => {
                // A string flag needs a following token to consume; a
                // trailing flag is ignored and stays in the input.
                if position + 1 < remaining.len() {
                    let value = remaining.remove(position + 1);
                    remaining.remove(position);
                    values.insert(spec.name.to_string(), ParamValue::Str(value));
                }
            }
        }
    }

    ParsedArgs { remaining, values }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<String> {
        input.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_string_argument() {
        let input = tokens("bad data aaaaah --foo bar");
        let schema = [ParamSpec::string("foo")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("bad data aaaaah"));
        assert_eq!(result.string("foo"), "bar");
    }

    #[test]
    fn test_parse_boolean_argument_keeps_next_token() {
        let input = tokens("lol --foo bar");
        let schema = [ParamSpec::boolean("foo")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("lol bar"));
        assert!(result.boolean("foo"));
    }

    #[test]
    fn test_every_declared_parameter_gets_a_zero_value() {
        let input = tokens("nothing here");
        let schema = [ParamSpec::string("foo"), ParamSpec::boolean("baz")];

        let result = parse(&input, &schema);

        assert_eq!(result.string("foo"), "");
        assert!(!result.boolean("baz"));
        assert_eq!(result.values.len(), 2);
    }

    #[test]
    fn test_short_flags() {
        let input = tokens("--foo bar -b");
        let schema = [ParamSpec::string("foo"), ParamSpec::boolean("baz")];

        let result = parse(&input, &schema);

        assert!(result.remaining.is_empty());
        assert_eq!(result.string("foo"), "bar");
        assert!(result.boolean("baz"));
    }

    #[test]
    fn test_short_boolean_flag_alone() {
        let input = tokens("-c");
        let schema = [ParamSpec::boolean("case")];

        let result = parse(&input, &schema);

        assert!(result.remaining.is_empty());
        assert!(result.boolean("case"));
    }

    #[test]
    fn test_flags_in_the_middle_of_input() {
        let input = tokens("something -f bar --baz");
        let schema = [ParamSpec::string("foo"), ParamSpec::boolean("baz")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("something"));
        assert_eq!(result.string("foo"), "bar");
        assert!(result.boolean("baz"));
    }

    #[test]
    fn test_unknown_flags_pass_through() {
        let input = tokens("--foo bar --baz yes");
        let schema = [ParamSpec::string("foo")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("--baz yes"));
        assert_eq!(result.string("foo"), "bar");
    }

    #[test]
    fn test_trailing_string_flag_is_ignored() {
        let input = tokens("--name");
        let schema = [ParamSpec::string("name")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("--name"));
        assert_eq!(result.string("name"), "");
    }

    #[test]
    fn test_schema_declaration_order_not_input_order() {
        let input = tokens("hi --foo bar xD --baz qux");
        let schema = [ParamSpec::string("baz"), ParamSpec::string("foo")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("hi xD"));
        assert_eq!(result.string("foo"), "bar");
        assert_eq!(result.string("baz"), "qux");
    }

    #[test]
    fn test_only_first_occurrence_is_consumed() {
        let input = tokens("--foo bar --foo again");
        let schema = [ParamSpec::string("foo")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("--foo again"));
        assert_eq!(result.string("foo"), "bar");
    }

    #[test]
    fn test_value_is_a_single_token_verbatim() {
        let input = tokens(r#"hi --foo ["thing","thing2"]"#);
        let schema = [ParamSpec::string("foo")];

        let result = parse(&input, &schema);

        assert_eq!(result.remaining, tokens("hi"));
        assert_eq!(result.string("foo"), r#"["thing","thing2"]"#);
    }

    #[test]
    fn test_parse_is_pure() {
        let input = tokens("a --foo bar -b c");
        let schema = [ParamSpec::string("foo"), ParamSpec::boolean("baz")];

        let first = parse(&input, &schema);
        let second = parse(&input, &schema);

        assert_eq!(first, second);
    }
}
