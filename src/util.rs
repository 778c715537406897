//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings, cut on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) { end -= 1; }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

/// Models sometimes wrap JSON in ```json fences even when asked not to.
pub fn strip_code_fences(s: &str) -> &str {
  let t = s.trim();
  let Some(rest) = t.strip_prefix("```") else { return t };
  let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
  rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Canonicalize the common YouTube URL forms to `https://www.youtube.com/watch?v=ID`.
/// Anything unrecognised is returned trimmed but otherwise untouched.
pub fn normalize_youtube_url(raw: &str) -> String {
  let input = raw.trim();
  match youtube_video_id(input) {
    Some(id) => format!("https://www.youtube.com/watch?v={id}"),
    None => input.to_string(),
  }
}

fn youtube_video_id(url: &str) -> Option<&str> {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  let rest = rest
    .strip_prefix("www.")
    .or_else(|| rest.strip_prefix("m."))
    .unwrap_or(rest);

  let candidate = if let Some(path) = rest.strip_prefix("youtu.be/") {
    path
  } else if let Some(path) = rest.strip_prefix("youtube.com/") {
    if let Some(p) = path.strip_prefix("shorts/").or_else(|| path.strip_prefix("embed/")).or_else(|| path.strip_prefix("live/")) {
      p
    } else if let Some(query) = path.strip_prefix("watch?") {
      query.split('&').find_map(|kv| kv.strip_prefix("v="))?
    } else {
      return None;
    }
  } else {
    return None;
  };

  let id = candidate.split(['?', '&', '#', '/']).next()?;
  let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
  valid.then_some(id)
}
