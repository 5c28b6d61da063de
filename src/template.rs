//! Turns markup with interpolation sites into a [`Child`] tree.
//!
//! Interpolated values are never spliced into the markup text itself.
//! Each site is replaced by a positional placeholder token made of private-use characters,
//! the markup is parsed into a transient element tree, and tokens found in text and attribute values
//! are then resolved against the original values.
//!
//! Only the subset of HTML that component templates need is understood:
//! elements, attributes (quoted, unquoted or bare), void elements, self-closing syntax, comments and basic entities.

use crate::{
	content,
	error::Error,
	event::EVENT_PREFIX,
	tree::{AttrValue, Child, Kind, Primitive, TreeNode},
	value::Value,
};
use tracing::{instrument, trace, warn};

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

/// Parses interleaved literal `parts` and `values`, as produced by a tagged template.
///
/// `parts.len()` must be `values.len() + 1`.
///
/// A single top-level element is returned as-is.
/// Anything else is wrapped in a [`Kind::Fragment`] node, so multi-root templates are still one [`Child`].
#[instrument(level = "trace", skip_all, fields(parts = parts.len(), values = values.len()))]
pub fn parse(parts: &[&str], values: Vec<Value>) -> Result<Child, Error> {
	if parts.len() != values.len() + 1 {
		return Err(Error::TemplateArity {
			placeholders: parts.len().saturating_sub(1),
			values: values.len(),
		});
	}

	let mut markup = String::with_capacity(parts.iter().map(|part| part.len() + 8).sum());
	for (i, part) in parts.iter().enumerate() {
		markup.push_str(part);
		if i < values.len() {
			markup.push(PLACEHOLDER_OPEN);
			markup.push_str(&i.to_string());
			markup.push(PLACEHOLDER_CLOSE);
		}
	}

	let nodes = MarkupParser::new(&markup).parse();
	let mut values: Vec<Option<Value>> = values.into_iter().map(Some).collect();
	let mut children = Vec::with_capacity(nodes.len());
	resolve_children(nodes, &mut values, &mut children)?;

	let single_element = matches!(children.as_slice(), [Child::Node(TreeNode { kind: Kind::Element(_), .. })]);
	if single_element {
		if let Some(element) = children.pop() {
			return Ok(element);
		}
	}
	Ok(Child::Node(TreeNode::fragment(children)))
}

/// Like [`parse`], but splits a single format-like literal on `{}`.
///
/// `{{` and `}}` stand for literal braces.
pub fn parse_format(markup: &str, values: Vec<Value>) -> Result<Child, Error> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = markup.chars().peekable();
	while let Some(c) = chars.next() {
		match (c, chars.peek()) {
			('{', Some('{')) | ('}', Some('}')) => {
				chars.next();
				current.push(c);
			}
			('{', Some('}')) => {
				chars.next();
				parts.push(std::mem::take(&mut current));
			}
			_ => current.push(c),
		}
	}
	parts.push(current);

	let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
	parse(&parts, values)
}

/// Builds a [`Child`] from markup with `{}` interpolation sites.
///
/// ```
/// use twig_dom::{template, Child};
///
/// let name = "World";
/// let tree = template!("<p class=\"greeting\">Hello, {}!</p>", name).unwrap();
/// let p = tree.as_node().unwrap();
/// assert_eq!(p.children, vec![Child::from("Hello, "), Child::from("World"), Child::from("!")]);
/// ```
#[macro_export]
macro_rules! template {
	($markup:expr $(, $value:expr)* $(,)?) => {
		$crate::template::parse_format($markup, ::std::vec![$($crate::Value::from($value)),*])
	};
}

/// The transient element tree.
#[derive(Debug, Clone, PartialEq)]
enum Markup {
	Text(String),
	Element {
		tag: String,
		attributes: Vec<(String, String)>,
		children: Vec<Markup>,
	},
}

struct OpenElement {
	tag: String,
	attributes: Vec<(String, String)>,
	children: Vec<Markup>,
}

struct MarkupParser<'a> {
	src: &'a str,
	pos: usize,
	root: Vec<Markup>,
	stack: Vec<OpenElement>,
}

impl<'a> MarkupParser<'a> {
	fn new(src: &'a str) -> Self {
		Self {
			src,
			pos: 0,
			root: Vec::new(),
			stack: Vec::new(),
		}
	}

	fn rest(&self) -> &'a str {
		&self.src[self.pos..]
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn children(&mut self) -> &mut Vec<Markup> {
		match self.stack.last_mut() {
			Some(open) => &mut open.children,
			None => &mut self.root,
		}
	}

	fn parse(mut self) -> Vec<Markup> {
		while self.pos < self.src.len() {
			let rest = self.rest();
			if rest.starts_with("<!--") {
				self.pos = rest.find("-->").map_or(self.src.len(), |end| self.pos + end + 3);
			} else if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
				self.close_tag();
			} else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
				self.open_tag();
			} else {
				self.text();
			}
		}

		while let Some(open) = self.stack.pop() {
			trace!("Closing unclosed <{}> at end of input.", open.tag);
			self.finish(open);
		}
		self.root
	}

	fn text(&mut self) {
		let rest = self.rest();
		// A '<' that doesn't start a tag is literal text.
		let end = rest
			.char_indices()
			.skip(1)
			.find(|&(i, c)| c == '<' && (rest[i + 1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!')))
			.map_or(rest.len(), |(i, _)| i);
		let text = decode_entities(&rest[..end]);
		self.pos += end;

		let children = self.children();
		if let Some(Markup::Text(previous)) = children.last_mut() {
			previous.push_str(&text);
		} else {
			children.push(Markup::Text(text));
		}
	}

	fn name(&mut self) -> String {
		let rest = self.rest();
		let end = rest
			.find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '='))
			.unwrap_or(rest.len());
		self.pos += end;
		rest[..end].to_ascii_lowercase()
	}

	fn skip_whitespace(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	fn open_tag(&mut self) {
		self.pos += 1;
		let tag = self.name();
		let mut attributes: Vec<(String, String)> = Vec::new();
		let mut self_closing = false;

		loop {
			self.skip_whitespace();
			match self.peek() {
				None => break,
				Some('>') => {
					self.pos += 1;
					break;
				}
				Some('/') => {
					self.pos += 1;
					if self.peek() == Some('>') {
						self.pos += 1;
						self_closing = true;
						break;
					}
				}
				Some(_) => {
					let name = self.name();
					if name.is_empty() {
						// Stray '='.
						self.pos += 1;
						continue;
					}
					self.skip_whitespace();
					let value = if self.peek() == Some('=') {
						self.pos += 1;
						self.skip_whitespace();
						self.attribute_value()
					} else {
						String::new()
					};
					if attributes.iter().any(|(existing, _)| *existing == name) {
						warn!("Duplicate attribute {:?} on <{}>; keeping the first.", name, tag);
					} else {
						attributes.push((name, value));
					}
				}
			}
		}

		let open = OpenElement {
			tag,
			attributes,
			children: Vec::new(),
		};
		if self_closing || VOID_ELEMENTS.contains(&open.tag.as_str()) {
			self.finish(open);
		} else {
			self.stack.push(open);
		}
	}

	fn attribute_value(&mut self) -> String {
		let rest = self.rest();
		match rest.chars().next() {
			Some(quote @ ('"' | '\'')) => {
				let inner = &rest[1..];
				let end = inner.find(quote).unwrap_or(inner.len());
				self.pos += 1 + end + usize::from(end < inner.len());
				decode_entities(&inner[..end])
			}
			_ => {
				let end = rest.find(|c: char| c.is_whitespace() || c == '>').unwrap_or(rest.len());
				self.pos += end;
				decode_entities(&rest[..end])
			}
		}
	}

	fn close_tag(&mut self) {
		self.pos += 2;
		let tag = self.name();
		let rest = self.rest();
		self.pos += rest.find('>').map_or(rest.len(), |end| end + 1);

		match self.stack.iter().rposition(|open| open.tag == tag) {
			Some(index) => {
				while self.stack.len() > index {
					if let Some(open) = self.stack.pop() {
						if open.tag != tag {
							trace!("Implicitly closing <{}> before </{}>.", open.tag, tag);
						}
						self.finish(open);
					}
				}
			}
			None if VOID_ELEMENTS.contains(&tag.as_str()) => (),
			None => warn!("Ignoring stray closing tag </{}>.", tag),
		}
	}

	fn finish(&mut self, open: OpenElement) {
		let OpenElement { tag, attributes, children } = open;
		self.children().push(Markup::Element { tag, attributes, children });
	}
}

fn decode_entities(text: &str) -> String {
	if !text.contains('&') {
		return text.to_owned();
	}

	let mut decoded = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(start) = rest.find('&') {
		decoded.push_str(&rest[..start]);
		rest = &rest[start..];
		let entity = rest[1..].find(';').map(|end| &rest[1..=end]);
		let replacement = entity.and_then(|entity| match entity {
			"amp" => Some('&'),
			"lt" => Some('<'),
			"gt" => Some('>'),
			"quot" => Some('"'),
			"apos" | "#39" => Some('\''),
			"nbsp" => Some('\u{A0}'),
			numeric if numeric.starts_with("#x") || numeric.starts_with("#X") => u32::from_str_radix(&numeric[2..], 16).ok().and_then(char::from_u32),
			numeric if numeric.starts_with('#') => numeric[1..].parse().ok().and_then(char::from_u32),
			_ => None,
		});
		match (entity, replacement) {
			(Some(entity), Some(replacement)) => {
				decoded.push(replacement);
				rest = &rest[entity.len() + 2..];
			}
			_ => {
				decoded.push('&');
				rest = &rest[1..];
			}
		}
	}
	decoded.push_str(rest);
	decoded
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment<'a> {
	Literal(&'a str),
	Placeholder(usize),
}

/// Splits `text` on placeholder tokens. Empty literals are omitted.
fn segments(text: &str) -> Vec<Segment<'_>> {
	let mut segments = Vec::new();
	let mut rest = text;
	while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
		let after_open = &rest[start + PLACEHOLDER_OPEN.len_utf8()..];
		let token = after_open
			.find(PLACEHOLDER_CLOSE)
			.and_then(|end| after_open[..end].parse::<usize>().ok().map(|index| (index, end)));
		match token {
			Some((index, end)) => {
				if start > 0 {
					segments.push(Segment::Literal(&rest[..start]));
				}
				segments.push(Segment::Placeholder(index));
				rest = &after_open[end + PLACEHOLDER_CLOSE.len_utf8()..];
			}
			None => {
				// Not one of ours. Keep it as text.
				let literal_end = start + PLACEHOLDER_OPEN.len_utf8();
				segments.push(Segment::Literal(&rest[..literal_end]));
				rest = &rest[literal_end..];
			}
		}
	}
	if !rest.is_empty() {
		segments.push(Segment::Literal(rest));
	}
	segments
}

fn take(values: &mut [Option<Value>], index: usize) -> Value {
	values.get_mut(index).and_then(Option::take).unwrap_or(Value::Null)
}

fn resolve_children(nodes: Vec<Markup>, values: &mut [Option<Value>], children: &mut Vec<Child>) -> Result<(), Error> {
	for node in nodes {
		match node {
			// Whitespace between elements.
			Markup::Text(text) if text.trim().is_empty() => (),
			Markup::Text(text) => {
				for segment in segments(&text) {
					match segment {
						// Markup indentation.
						Segment::Literal(literal) if literal.trim().is_empty() && literal.contains('\n') => (),
						Segment::Literal(literal) => children.push(Child::Text(Primitive::Str(literal.to_owned()))),
						Segment::Placeholder(index) => resolve_child(take(values, index), children)?,
					}
				}
			}
			Markup::Element { tag, attributes, children: markup_children } => {
				let mut node = TreeNode::element(tag);
				for (name, value) in attributes {
					let value = resolve_attribute(&name, &value, values);
					node.attributes.insert(name, value);
				}
				resolve_children(markup_children, values, &mut node.children)?;
				children.push(Child::Node(node));
			}
		}
	}
	Ok(())
}

fn resolve_child(value: Value, children: &mut Vec<Child>) -> Result<(), Error> {
	match value {
		Value::Null => (),
		Value::Primitive(primitive) | Value::Child(Child::Text(primitive)) => children.push(Child::Text(Primitive::Str(primitive.to_string()))),
		Value::Child(child) => children.push(child),
		Value::List(items) => {
			for item in items {
				match item {
					Value::Null => (),
					nested @ Value::List(_) => children.push(Child::try_from(nested)?),
					item => resolve_child(item, children)?,
				}
			}
		}
		Value::Handler(_) | Value::Style(_) => return Err(Error::MalformedTree { found: value.describe() }),
	}
	Ok(())
}

fn resolve_attribute(name: &str, raw: &str, values: &mut [Option<Value>]) -> AttrValue {
	let segments = segments(raw);

	if let [Segment::Placeholder(index)] = segments.as_slice() {
		match take(values, *index) {
			Value::Handler(handler) if name.starts_with(EVENT_PREFIX) => return AttrValue::Handler(handler),
			Value::Style(style) => return AttrValue::Style(style),
			value => return AttrValue::Text(stringify_attribute_segment(name, value)),
		}
	}

	let mut text = String::with_capacity(raw.len());
	for segment in segments {
		match segment {
			Segment::Literal(literal) => text.push_str(literal),
			Segment::Placeholder(index) => text.push_str(&stringify_attribute_segment(name, take(values, index))),
		}
	}
	trace!("Resolved attribute {:?} to {:?}.", name, content(&text));
	AttrValue::Text(text)
}

fn stringify_attribute_segment(name: &str, value: Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::Primitive(primitive) | Value::Child(Child::Text(primitive)) => primitive.to_string(),
		other => {
			warn!("Ignoring {} interpolated into attribute {:?}.", other.describe(), name);
			String::new()
		}
	}
}
