//! Inflection-chart extraction from Wiktionary article HTML.

use lexis_core::{entry::Chart, language::Language};

use crate::html::{Document, NodeId, ROOT};

/// All charts for `lang` found in an article. Pure; an article without
/// matching tables yields an empty list.
pub fn extract_charts(html: &str, lang: Language) -> Vec<Chart> {
  let mut doc = Document::parse(html);
  let charts = match lang {
    Language::French => french(&mut doc),
    Language::Russian => slavic(&mut doc, "lang-ru", "ru-Latn"),
    Language::Ukrainian => slavic(&mut doc, "lang-uk", "uk-Latn"),
  };
  charts.into_iter().map(Chart::new).collect()
}

fn contains_class(doc: &Document, id: NodeId, class: &str) -> bool {
  doc.descendants(id).into_iter().any(|d| doc.has_class(d, class))
}

// ─── French ──────────────────────────────────────────────────────────────────

fn french(doc: &mut Document) -> Vec<Vec<Vec<String>>> {
  let tables: Vec<NodeId> = doc
    .find_all(ROOT, "table")
    .into_iter()
    .filter(|t| contains_class(doc, *t, "lang-fr"))
    .collect();

  if tables.is_empty() {
    // Adjectives carry their forms inline instead of in a table.
    let forms: Vec<String> = doc
      .descendants(ROOT)
      .into_iter()
      .filter(|d| doc.has_class(*d, "form-of") && doc.has_class(*d, "lang-fr"))
      .map(|d| doc.text(d))
      .collect();
    return if forms.is_empty() { Vec::new() } else { vec![vec![forms]] };
  }

  let mut charts = Vec::with_capacity(tables.len());
  for table in tables {
    for span in doc.find_all(table, "span") {
      if doc.has_class(span, "IPA") {
        doc.remove(span);
      }
    }

    let mut chart = Vec::new();
    for tr in doc.find_all(table, "tr") {
      let row: Vec<String> = doc
        .child_elements(tr)
        .filter(|cell| {
          let colspan = doc.attr(*cell, "colspan");
          match doc.name(*cell) {
            Some("td") => colspan != Some("8"),
            Some("th") => colspan == Some("6"),
            _ => false,
          }
        })
        .map(|cell| doc.text(cell).trim().to_owned())
        .collect();
      if !row.is_empty() {
        chart.push(row);
      }
    }
    charts.push(chart);
  }
  charts
}

// ─── Russian / Ukrainian ─────────────────────────────────────────────────────

fn slavic(
  doc: &mut Document,
  lang_class: &str,
  transliteration: &str,
) -> Vec<Vec<Vec<String>>> {
  let tables: Vec<NodeId> = doc
    .find_all(ROOT, "table")
    .into_iter()
    .filter(|t| {
      doc.has_class(*t, "inflection-table") && contains_class(doc, *t, lang_class)
    })
    .collect();

  let mut charts = Vec::with_capacity(tables.len());
  for table in tables {
    for span in doc.find_all(table, "span") {
      if doc.attr(span, "lang") == Some(transliteration) {
        doc.remove(span);
      }
    }

    let mut chart: Vec<Vec<String>> = doc
      .find_all(table, "tr")
      .into_iter()
      .map(|tr| {
        doc
          .find_all(tr, "td")
          .into_iter()
          .map(|td| doc.text(td).trim().to_owned())
          .collect::<Vec<_>>()
      })
      .filter(|row| !row.is_empty())
      .collect();

    let Some(width) = chart.iter().map(Vec::len).max() else {
      tracing::debug!(%lang_class, "inflection table without cells");
      continue;
    };
    // Short rows lack the leading merged cells; pad right after the label.
    for row in &mut chart {
      let missing = width - row.len();
      row.splice(1..1, std::iter::repeat_n(String::new(), missing));
    }
    charts.push(chart);
  }

  // Adjective degrees sit in the headword line, one row each.
  for class in ["comparative-form-of", "superlative-form-of"] {
    let forms: Vec<String> = doc
      .find_all(ROOT, "b")
      .into_iter()
      .filter(|b| doc.has_class(*b, class) && doc.has_class(*b, lang_class))
      .map(|b| doc.text(b))
      .collect();
    if !forms.is_empty() {
      charts.push(vec![forms]);
    }
  }
  charts
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rows(chart: &Chart) -> Vec<Vec<&str>> {
    chart
      .rows()
      .iter()
      .map(|r| r.iter().map(String::as_str).collect())
      .collect()
  }

  // ── French ──────────────────────────────────────────────────────────────

  const FR_VERB: &str = r#"
<html><body>
<table class="inflection-table">
  <tr><th colspan="6">infinitive</th><th>ignored</th></tr>
  <tr><td colspan="8">header spanning everything</td></tr>
  <tr><th>je</th><td><span class="lang-fr">parle</span> <span class="IPA">/paʁl/</span></td><td>parlais</td></tr>
  <tr><th>nous</th><td><span class="lang-fr">parlons</span></td><td>parlions</td></tr>
</table>
<table class="wikitable"><tr><td>unrelated</td></tr></table>
</body></html>
"#;

  #[test]
  fn french_tables_keep_cells_and_drop_ipa() {
    let charts = extract_charts(FR_VERB, Language::French);
    assert_eq!(charts.len(), 1);
    assert_eq!(rows(&charts[0]), [
      vec!["infinitive"],
      vec!["parle", "parlais"],
      vec!["parlons", "parlions"],
    ]);
  }

  #[test]
  fn french_adjective_forms_fallback() {
    let html = r#"
<p><b class="form-of lang-fr">belle</b>, <b class="form-of lang-fr">beaux</b>,
<b class="form-of lang-it">bello</b></p>"#;
    let charts = extract_charts(html, Language::French);
    assert_eq!(charts.len(), 1);
    assert_eq!(rows(&charts[0]), [vec!["belle", "beaux"]]);
  }

  #[test]
  fn french_without_tables_or_forms_is_empty() {
    assert!(extract_charts("<p>nothing here</p>", Language::French).is_empty());
  }

  // ── Russian / Ukrainian ─────────────────────────────────────────────────

  const RU_NOUN: &str = r#"
<table class="inflection-table inflection-ru">
  <tr><th></th><th>singular</th><th>plural</th></tr>
  <tr><th>nominative</th>
      <td><span class="Cyrl lang-ru">кни́га</span><br><span lang="ru-Latn">kníga</span></td>
      <td><span class="Cyrl lang-ru">кни́ги</span></td></tr>
  <tr><td>genitive</td><td>кни́г</td></tr>
</table>
<table class="inflection-table"><tr><td><span class="lang-uk">книга</span></td></tr></table>
<script>var t = "<table class='inflection-table'>";</script>
"#;

  #[test]
  fn russian_header_rows_skipped_and_transliteration_removed() {
    let charts = extract_charts(RU_NOUN, Language::Russian);
    assert_eq!(charts.len(), 1);
    assert_eq!(rows(&charts[0]), [vec!["кни́га", "кни́ги"], vec![
      "genitive", "кни́г"
    ]]);
  }

  #[test]
  fn ukrainian_picks_its_own_tables() {
    let charts = extract_charts(RU_NOUN, Language::Ukrainian);
    assert_eq!(charts.len(), 1);
    assert_eq!(rows(&charts[0]), [vec!["книга"]]);
  }

  #[test]
  fn transliteration_is_removed_and_short_rows_padded() {
    let html = r#"
<table class="inflection-table">
  <tr><td>nom</td><td><span class="lang-uk">кіт</span> <span lang="uk-Latn">kit</span></td><td>коти</td></tr>
  <tr><td>voc</td><td>коте</td></tr>
  <tr><th>only headers</th></tr>
</table>"#;
    let charts = extract_charts(html, Language::Ukrainian);
    assert_eq!(rows(&charts[0]), [vec!["nom", "кіт", "коти"], vec![
      "voc", "", "коте"
    ]]);
  }

  #[test]
  fn tables_without_language_marker_are_ignored() {
    let html = r#"<table class="inflection-table"><tr><td>x</td></tr></table>"#;
    assert!(extract_charts(html, Language::Russian).is_empty());
  }

  #[test]
  fn russian_adjective_degrees_become_one_row_charts() {
    let html = r#"
<p><strong class="Cyrl headword" lang="ru">но́вый</strong> (comparative
<b class="Cyrl comparative-form-of lang-ru">нове́е</b> or
<b class="Cyrl comparative-form-of lang-ru">нове́й</b>, superlative
<b class="Cyrl superlative-form-of lang-ru">нове́йший</b>)</p>
<p><b class="Cyrl comparative-form-of lang-uk">нові́ший</b></p>
<table class="inflection-table">
  <tr><td>nom</td><td><span class="lang-ru">но́вый</span></td></tr>
</table>"#;
    let charts = extract_charts(html, Language::Russian);
    assert_eq!(charts.len(), 3);
    assert_eq!(rows(&charts[0]), [vec!["nom", "но́вый"]]);
    assert_eq!(rows(&charts[1]), [vec!["нове́е", "нове́й"]]);
    assert_eq!(rows(&charts[2]), [vec!["нове́йший"]]);

    let uk = extract_charts(html, Language::Ukrainian);
    assert_eq!(uk.len(), 1);
    assert_eq!(rows(&uk[0]), [vec!["нові́ший"]]);
  }

  #[test]
  fn degree_forms_without_a_table_still_count() {
    let html = r#"<b class="superlative-form-of lang-ru">лучший</b>"#;
    let charts = extract_charts(html, Language::Russian);
    assert_eq!(charts.len(), 1);
    assert_eq!(rows(&charts[0]), [vec!["лучший"]]);
  }
}
