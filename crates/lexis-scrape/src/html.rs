//! A small, forgiving HTML tree built on `quick-xml`'s pull parser.
//!
//! Only what chart extraction needs: elements with attributes, text, and a
//! handful of selector-style queries. Mismatched end tags close the nearest
//! open element of the same name; void elements never take children;
//! `<script>` and `<style>` bodies are skipped unparsed.

use quick_xml::{Reader, events::Event, name::QName};

pub type NodeId = usize;

const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
  "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug)]
enum NodeKind {
  Element {
    name:  String,
    attrs: Vec<(String, String)>,
  },
  Text(String),
}

#[derive(Debug)]
struct Node {
  kind:     NodeKind,
  children: Vec<NodeId>,
  removed:  bool,
}

/// A parsed document. Node `0` is a synthetic root element.
#[derive(Debug)]
pub struct Document {
  nodes: Vec<Node>,
}

pub const ROOT: NodeId = 0;

fn decode(bytes: &[u8]) -> String {
  let raw = String::from_utf8_lossy(bytes);
  html_escape::decode_html_entities(&raw).into_owned()
}

fn lower(bytes: &[u8]) -> String { String::from_utf8_lossy(bytes).to_ascii_lowercase() }

impl Document {
  /// Parse `html`, never failing: a reader error ends the tree where it
  /// occurred.
  pub fn parse(html: &str) -> Self {
    let mut doc = Document {
      nodes: vec![Node {
        kind:     NodeKind::Element { name: String::new(), attrs: Vec::new() },
        children: Vec::new(),
        removed:  false,
      }],
    };

    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.expand_empty_elements = false;
    config.check_comments = false;

    let mut stack = vec![ROOT];

    loop {
      let parent = stack.last().copied().unwrap_or(ROOT);
      match reader.read_event() {
        Ok(Event::Start(e)) => {
          let name = lower(e.name().as_ref());
          let attrs = e
            .html_attributes()
            .flatten()
            .map(|a| (lower(a.key.as_ref()), decode(&a.value)))
            .collect();

          if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let end = e.name().as_ref().to_vec();
            if let Err(err) = reader.read_text(QName(&end)) {
              tracing::debug!(%err, element = %name, "unterminated raw text element");
              break;
            }
            continue;
          }

          doc.close_implied(&mut stack, &name);
          let parent = stack.last().copied().unwrap_or(ROOT);
          let id = doc.push(parent, NodeKind::Element { name: name.clone(), attrs });
          if !VOID_ELEMENTS.contains(&name.as_str()) {
            stack.push(id);
          }
        }
        Ok(Event::Empty(e)) => {
          let name = lower(e.name().as_ref());
          let attrs = e
            .html_attributes()
            .flatten()
            .map(|a| (lower(a.key.as_ref()), decode(&a.value)))
            .collect();
          doc.push(parent, NodeKind::Element { name, attrs });
        }
        Ok(Event::End(e)) => {
          let name = lower(e.name().as_ref());
          if let Some(pos) = stack
            .iter()
            .rposition(|id| *id != ROOT && doc.name(*id) == Some(name.as_str()))
          {
            stack.truncate(pos);
          }
        }
        Ok(Event::Text(t)) => {
          doc.push(parent, NodeKind::Text(decode(&t)));
        }
        Ok(Event::CData(t)) => {
          doc.push(parent, NodeKind::Text(String::from_utf8_lossy(&t).into_owned()));
        }
        Ok(Event::Eof) => break,
        Ok(_) => {}
        Err(err) => {
          tracing::debug!(
            %err,
            position = reader.error_position(),
            "stopped parsing malformed html"
          );
          break;
        }
      }
    }

    doc
  }

  /// A new cell closes an open cell of the same row, and a new row closes
  /// an open row of the same table.
  fn close_implied(&self, stack: &mut Vec<NodeId>, opening: &str) {
    let (closes, scope): (&[&str], &[&str]) = match opening {
      "td" | "th" => (&["td", "th"], &["tr", "table"]),
      "tr" => (&["tr"], &["table", "thead", "tbody", "tfoot"]),
      _ => return,
    };
    for pos in (1..stack.len()).rev() {
      let Some(name) = self.name(stack[pos]) else {
        continue;
      };
      if closes.contains(&name) {
        stack.truncate(pos);
        return;
      }
      if scope.contains(&name) {
        return;
      }
    }
  }

  fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
    let id = self.nodes.len();
    self.nodes.push(Node { kind, children: Vec::new(), removed: false });
    self.nodes[parent].children.push(id);
    id
  }

  // ─── Node accessors ────────────────────────────────────────────────────

  /// Lower-cased tag name, or `None` for text nodes.
  pub fn name(&self, id: NodeId) -> Option<&str> {
    match &self.nodes[id].kind {
      NodeKind::Element { name, .. } => Some(name),
      NodeKind::Text(_) => None,
    }
  }

  pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
    match &self.nodes[id].kind {
      NodeKind::Element { attrs, .. } => attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str()),
      NodeKind::Text(_) => None,
    }
  }

  pub fn has_class(&self, id: NodeId, class: &str) -> bool {
    self
      .attr(id, "class")
      .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
  }

  /// Element children that have not been removed.
  pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    self.nodes[id]
      .children
      .iter()
      .copied()
      .filter(|c| !self.nodes[*c].removed && self.name(*c).is_some())
  }

  /// Every live element below `id` in document order, `id` excluded.
  pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut pending: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
    while let Some(next) = pending.pop() {
      let node = &self.nodes[next];
      if node.removed || self.name(next).is_none() {
        continue;
      }
      out.push(next);
      pending.extend(node.children.iter().rev().copied());
    }
    out
  }

  /// Descendants of `id` with tag `name`.
  pub fn find_all(&self, id: NodeId, name: &str) -> Vec<NodeId> {
    self
      .descendants(id)
      .into_iter()
      .filter(|d| self.name(*d) == Some(name))
      .collect()
  }

  /// Concatenated text of every live text node below `id`.
  pub fn text(&self, id: NodeId) -> String {
    let mut out = String::new();
    self.collect_text(id, &mut out);
    out
  }

  fn collect_text(&self, id: NodeId, out: &mut String) {
    let node = &self.nodes[id];
    if node.removed {
      return;
    }
    match &node.kind {
      NodeKind::Text(text) => out.push_str(text),
      NodeKind::Element { .. } => {
        for child in &node.children {
          self.collect_text(*child, out);
        }
      }
    }
  }

  /// Detach `id` and everything below it from queries and text.
  pub fn remove(&mut self, id: NodeId) { self.nodes[id].removed = true; }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_nested_elements_and_text() {
    let doc = Document::parse("<div class='a b'><p>one <b>two</b></p></div>");
    let divs = doc.find_all(ROOT, "div");
    assert_eq!(divs.len(), 1);
    assert!(doc.has_class(divs[0], "b"));
    assert!(!doc.has_class(divs[0], "c"));
    assert_eq!(doc.text(divs[0]), "one two");
  }

  #[test]
  fn tolerates_void_and_mismatched_tags() {
    let doc = Document::parse("<table><tr><td>a<br>b</td><td>c</span></td></tr></table>");
    let cells = doc.find_all(ROOT, "td");
    assert_eq!(cells.len(), 2);
    assert_eq!(doc.text(cells[0]), "ab");
    assert_eq!(doc.text(cells[1]), "c");
  }

  #[test]
  fn unclosed_cells_and_rows_are_closed_implicitly() {
    let doc = Document::parse("<table><tr><td>a<td>b<tr><th>c</table><p>d</p>");
    let rows = doc.find_all(ROOT, "tr");
    assert_eq!(rows.len(), 2);
    assert_eq!(doc.child_elements(rows[0]).count(), 2);
    assert_eq!(doc.child_elements(rows[1]).count(), 1);

    // The paragraph is not swallowed by the table.
    let p = doc.find_all(ROOT, "p")[0];
    assert!(doc.child_elements(ROOT).any(|c| c == p));
  }

  #[test]
  fn html_attributes_and_entities() {
    let doc = Document::parse("<td colspan=8 data-x>caf&eacute;&nbsp;&amp; co</td>");
    let td = doc.find_all(ROOT, "td")[0];
    assert_eq!(doc.attr(td, "colspan"), Some("8"));
    assert_eq!(doc.attr(td, "data-x"), Some(""));
    assert_eq!(doc.text(td), "café\u{a0}& co");
  }

  #[test]
  fn script_and_style_bodies_are_skipped() {
    let doc = Document::parse(
      "<p>x</p><script>if (a < b) { document.write('<td>'); }</script><style>td{}</style><p>y</p>",
    );
    assert_eq!(doc.find_all(ROOT, "p").len(), 2);
    assert!(doc.find_all(ROOT, "td").is_empty());
    assert_eq!(doc.text(ROOT), "xy");
  }

  #[test]
  fn removed_nodes_drop_out_of_text_and_queries() {
    let mut doc = Document::parse("<td>дом <span class='tr'>dom</span></td>");
    let span = doc.find_all(ROOT, "span")[0];
    doc.remove(span);
    assert!(doc.find_all(ROOT, "span").is_empty());
    assert_eq!(doc.text(ROOT).trim(), "дом");
  }
}
