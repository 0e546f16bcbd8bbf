use crate::models::DashboardData;

pub fn render_dashboard(data: &DashboardData) -> String {
    let display = data.display();
    // keep "</script>" inside user text from closing the inline script
    let state_json = serde_json::to_string(data)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    DASHBOARD_HTML
        .replace("{{TOTAL}}", &escape_html(&display.format_amount(data.current_amount)))
        .replace("{{STATE_JSON}}", &state_json)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_ticker() -> String {
    TICKER_HTML.to_string()
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Streamer Goals Dashboard</title>
  <style>
    :root {
      --bg: #f4f1fb;
      --ink: #221b33;
      --accent: #b967ff;
      --accent-2: #05c98a;
      --danger: #e5484d;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(34, 27, 51, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 28px 16px 48px;
    }

    main {
      width: min(900px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 20px;
    }

    section {
      background: var(--card);
      border-radius: 18px;
      box-shadow: var(--shadow);
      padding: 20px 24px;
    }

    h1 {
      margin: 0 0 4px;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.2rem;
    }

    form,
    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
      margin-bottom: 10px;
    }

    input,
    textarea {
      padding: 8px 10px;
      border: 1px solid #cfc6e4;
      border-radius: 10px;
      font: inherit;
    }

    textarea {
      width: 100%;
      resize: none;
    }

    button {
      border: none;
      border-radius: 10px;
      padding: 8px 14px;
      background: var(--accent);
      color: white;
      font: inherit;
      cursor: pointer;
    }

    button.secondary {
      background: #e7e1f5;
      color: var(--ink);
    }

    button.danger {
      background: var(--danger);
    }

    .bar {
      height: 10px;
      border-radius: 999px;
      background: #e7e1f5;
      overflow: hidden;
    }

    .bar > div {
      height: 100%;
      background: var(--accent);
      transition: width 600ms ease-out;
    }

    ul {
      list-style: none;
      padding: 0;
      margin: 0;
      display: grid;
      gap: 10px;
    }

    li {
      border: 1px solid #e7e1f5;
      border-radius: 12px;
      padding: 10px 14px;
      display: grid;
      gap: 6px;
    }

    .total {
      font-size: 1.6rem;
      font-weight: 600;
    }

    .error {
      color: var(--danger);
      min-height: 1.2em;
    }

    iframe {
      width: 100%;
      height: 170px;
      border: none;
      border-radius: 12px;
      background: #120d1f;
    }
  </style>
</head>
<body>
  <main>
    <section>
      <h1>Streamer Goals Dashboard</h1>
      <p class="error" id="error"></p>
    </section>

    <section>
      <h2>Current Amount</h2>
      <div class="row">
        <input id="symbol" class="narrow" size="3" placeholder="Symbol" />
        <button class="secondary" id="symbol-position"></button>
      </div>
      <form id="amount-form">
        <input id="amount" type="number" min="0.01" step="0.01" placeholder="Enter amount" required />
        <button type="submit" data-action="add">Add</button>
        <button type="submit" data-action="sub" class="danger">Subtract</button>
      </form>
      <form id="subs-form">
        <input id="subs" type="number" min="1" step="1" value="1" required />
        <button type="submit" data-multiplier="5">x5</button>
        <button type="submit" data-multiplier="10">x10</button>
        <button type="submit" data-multiplier="30">x30</button>
      </form>
      <p>Current total: <span class="total" id="total">{{TOTAL}}</span></p>
    </section>

    <section>
      <h2>Set Goal</h2>
      <form id="goal-form">
        <input id="goal-name" placeholder="Goal name" required />
        <input id="goal-target" type="number" min="0.01" step="0.01" placeholder="Target" required />
        <button type="submit" id="goal-submit">Set Goal</button>
        <button type="button" class="danger" id="goal-remove">Remove Goal</button>
      </form>
      <div id="goal-progress"></div>
    </section>

    <section>
      <h2>Milestone Goals</h2>
      <form id="milestone-form">
        <input id="milestone-name" placeholder="Goal name" required />
        <input id="milestone-target" type="number" min="0.01" step="0.01" placeholder="Target" required />
        <button type="submit">Add Milestone Goal</button>
      </form>
      <ul id="milestones"></ul>
    </section>

    <section>
      <h2>Recurring Goal</h2>
      <form id="recurring-form">
        <input id="recurring-interval" type="number" min="1" step="1" placeholder="Interval" required />
        <input id="recurring-action" placeholder="e.g. Do a dance" required />
        <button type="submit" id="recurring-submit">Set Recurring Goal</button>
        <button type="button" class="danger" id="recurring-remove">Remove Goal</button>
      </form>
      <div id="recurring-progress"></div>
    </section>

    <section>
      <h2>Ticker Customization</h2>
      <div class="row">
        <label><input type="checkbox" id="show-background" /> Show background effect</label>
        <label><input type="checkbox" id="show-border" /> Show neon border</label>
      </div>
      <form id="item-form">
        <textarea id="item-content" rows="3" maxlength="300" placeholder="Enter custom ticker text"></textarea>
        <button type="submit">Add Ticker Item</button>
      </form>
      <ul id="items"></ul>
    </section>

    <section>
      <h2>Ticker Preview</h2>
      <iframe src="/ticker" title="Ticker preview"></iframe>
    </section>
  </main>

  <script>
    let state = {{STATE_JSON}};
    const $ = (id) => document.getElementById(id);
    const errorEl = $('error');

    const money = (amount) => {
      const value = Number(amount || 0).toFixed(2);
      return state.symbolPosition === 'right' ? `${value}${state.symbol}` : `${state.symbol}${value}`;
    };

    const escapeHtml = (text) =>
      String(text).replace(/[&<>"']/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' })[ch]);

    const bar = (current, target) => {
      const percent = Math.min(100, Math.max(0, (current / target) * 100));
      return `<div class="bar"><div style="width:${percent}%"></div></div>`;
    };

    const goalLine = (goal) =>
      `${escapeHtml(money(goal.progress))} / ${escapeHtml(money(goal.target))} (${((goal.progress / goal.target) * 100).toFixed(1)}%)`;

    const call = async (method, url, body) => {
      errorEl.textContent = '';
      try {
        const response = await fetch(url, {
          method,
          headers: body ? { 'Content-Type': 'application/json' } : {},
          body: body ? JSON.stringify(body) : undefined
        });
        if (!response.ok) {
          errorEl.textContent = await response.text();
          return;
        }
        state = await response.json();
        render();
      } catch (err) {
        errorEl.textContent = 'Request failed.';
        console.error(err);
      }
    };

    const render = () => {
      $('total').textContent = money(state.currentAmount);
      $('symbol').value = state.symbol;
      $('symbol-position').textContent = `Symbol: ${state.symbolPosition === 'right' ? 'Right' : 'Left'}`;
      $('show-background').checked = state.showBackground;
      $('show-border').checked = state.showBorder;

      const goal = state.setGoal;
      $('goal-submit').textContent = goal ? 'Update Goal' : 'Set Goal';
      $('goal-remove').hidden = !goal;
      $('goal-progress').innerHTML = goal
        ? `<p><strong>${escapeHtml(goal.name)}</strong>: ${goalLine(goal)}</p>${bar(goal.progress, goal.target)}`
        : '';

      $('milestones').innerHTML = state.milestoneGoals
        .map((m) => `
          <li>
            <div class="row"><strong>${escapeHtml(m.name)}</strong>
              <button class="danger" data-remove-milestone="${m.id}">Remove</button></div>
            <span>Progress: ${goalLine(m)}</span>
            ${bar(m.progress, m.target)}
          </li>`)
        .join('');

      const recurring = state.recurringGoal;
      $('recurring-submit').textContent = recurring ? 'Update Recurring Goal' : 'Set Recurring Goal';
      $('recurring-remove').hidden = !recurring;
      if (recurring) {
        const amount = state.currentAmount;
        const next = Math.ceil(amount / recurring.interval) * recurring.interval;
        const reached = Math.floor(amount / recurring.interval);
        $('recurring-progress').innerHTML = `
          <p>Next milestone: ${escapeHtml(money(next))} | Action: ${escapeHtml(recurring.action)} | Times reached: ${reached}</p>
          ${bar(amount % recurring.interval, recurring.interval)}`;
      } else {
        $('recurring-progress').innerHTML = '';
      }

      $('items').innerHTML = state.tickerItems
        .map((item) => `
          <li class="row"><span style="white-space:pre-line">${escapeHtml(item.content)}</span>
            <button class="danger" data-remove-item="${item.id}">Remove</button></li>`)
        .join('');
    };

    $('amount-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const amount = parseFloat($('amount').value);
      if (Number.isNaN(amount)) {
        return;
      }
      const action = event.submitter ? event.submitter.dataset.action : 'add';
      $('amount').value = '';
      call('POST', '/api/amount', { action, amount });
    });

    $('subs-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const count = parseInt($('subs').value, 10);
      const multiplier = parseInt(event.submitter ? event.submitter.dataset.multiplier : '5', 10);
      $('subs').value = '1';
      call('POST', '/api/subs', { count, multiplier });
    });

    $('symbol').addEventListener('change', (event) => {
      call('PUT', '/api/display/symbol', { symbol: event.target.value });
    });
    $('symbol-position').addEventListener('click', () => call('POST', '/api/display/symbol-position/toggle'));
    $('show-background').addEventListener('change', () => call('POST', '/api/display/background/toggle'));
    $('show-border').addEventListener('change', () => call('POST', '/api/display/border/toggle'));

    $('goal-form').addEventListener('submit', (event) => {
      event.preventDefault();
      call('PUT', '/api/goal', { name: $('goal-name').value, target: parseFloat($('goal-target').value) });
    });
    $('goal-remove').addEventListener('click', () => {
      $('goal-name').value = '';
      $('goal-target').value = '';
      call('DELETE', '/api/goal');
    });

    $('milestone-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const body = { name: $('milestone-name').value, target: parseFloat($('milestone-target').value) };
      $('milestone-name').value = '';
      $('milestone-target').value = '';
      call('POST', '/api/milestones', body);
    });
    $('milestones').addEventListener('click', (event) => {
      const id = event.target.dataset.removeMilestone;
      if (id) {
        call('DELETE', `/api/milestones/${encodeURIComponent(id)}`);
      }
    });

    $('recurring-form').addEventListener('submit', (event) => {
      event.preventDefault();
      call('PUT', '/api/recurring', {
        interval: parseFloat($('recurring-interval').value),
        action: $('recurring-action').value
      });
    });
    $('recurring-remove').addEventListener('click', () => {
      $('recurring-interval').value = '';
      $('recurring-action').value = '';
      call('DELETE', '/api/recurring');
    });

    $('item-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const content = $('item-content').value.trim();
      if (!content) {
        return;
      }
      $('item-content').value = '';
      call('POST', '/api/ticker-items', { content });
    });
    $('items').addEventListener('click', (event) => {
      const id = event.target.dataset.removeItem;
      if (id) {
        call('DELETE', `/api/ticker-items/${encodeURIComponent(id)}`);
      }
    });

    if (state.setGoal) {
      $('goal-name').value = state.setGoal.name;
      $('goal-target').value = state.setGoal.target;
    }
    if (state.recurringGoal) {
      $('recurring-interval').value = state.recurringGoal.interval;
      $('recurring-action').value = state.recurringGoal.action;
    }
    render();
  </script>
</body>
</html>
"#;

const TICKER_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Ticker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Press+Start+2P&display=swap');

    body {
      margin: 0;
      height: 100vh;
      display: grid;
      place-items: center;
      background: transparent;
      font-family: 'Press Start 2P', monospace;
    }

    .ticker {
      width: min(760px, 96vw);
      height: 120px;
      padding: 1rem;
      border-radius: 8px;
      display: flex;
      align-items: center;
      position: relative;
      color: white;
    }

    .ticker.background {
      background: linear-gradient(45deg, #01012b, #240b36, #1a0b2e, #01012b);
    }

    .ticker.border {
      box-shadow: 0 0 0 2px #05ffa1, 0 0 12px rgba(1, 255, 255, 0.6);
    }

    .content {
      width: 100%;
      opacity: 0;
      transform: scale(0.98);
      transition: all 400ms cubic-bezier(0.4, 0, 0.2, 1);
    }

    .content.visible {
      opacity: 1;
      transform: scale(1);
    }

    .label {
      margin: 0 0 8px;
      color: #ff71ce;
      text-shadow: 0 0 4px #ff71ce, 0 0 8px #ff71ce;
      font-size: 0.8rem;
    }

    .track {
      position: relative;
      height: 40px;
      border-radius: 999px;
      overflow: hidden;
      border: 2px solid #05ffa1;
      background: #01012b;
    }

    .fill {
      position: absolute;
      inset: 0 auto 0 0;
      background: linear-gradient(to right, #b967ff, #ff71ce);
    }

    .highlight {
      position: absolute;
      inset: 0 auto 0 0;
      background: linear-gradient(to right, #05ffa1, #01ffff);
    }

    .numbers {
      position: absolute;
      inset: 0;
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 0 12px;
      font-size: 0.7rem;
    }

    .caption,
    .text {
      margin: 8px 0 0;
      font-size: 0.75rem;
      white-space: pre-line;
    }

    .celebration .caption {
      text-align: center;
      font-size: 1rem;
    }
  </style>
</head>
<body>
  <div class="ticker" id="ticker">
    <div class="content" id="content"></div>
  </div>
  <script>
    const tickerEl = document.getElementById('ticker');
    const contentEl = document.getElementById('content');

    const escapeHtml = (text) =>
      String(text).replace(/[&<>"']/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' })[ch]);

    const renderBar = (bar) => `
      <p class="label">${escapeHtml(bar.label)}</p>
      <div class="track">
        <div class="fill" style="width:${bar.fillPercent}%">
          <div class="highlight" style="width:${bar.highlightPercent}%"></div>
        </div>
        <div class="numbers">
          <span>${escapeHtml(bar.currentText)}</span>
          <span>${bar.percentText}</span>
          <span>${escapeHtml(bar.targetText)}</span>
        </div>
      </div>`;

    const render = (frame) => {
      tickerEl.classList.toggle('background', frame.showBackground);
      tickerEl.classList.toggle('border', frame.showBorder);
      tickerEl.classList.toggle('celebration', frame.kind === 'celebration');
      contentEl.classList.toggle('visible', frame.visible);

      let html = '';
      if (frame.bar) {
        html += renderBar(frame.bar);
      }
      if (frame.text) {
        html += `<p class="text">${escapeHtml(frame.text)}</p>`;
      }
      if (frame.caption) {
        html += `<p class="caption">${escapeHtml(frame.caption)}</p>`;
      }
      contentEl.innerHTML = html;
    };

    const refresh = async () => {
      try {
        const response = await fetch('/api/ticker/frame');
        if (response.ok) {
          render(await response.json());
        }
      } catch (err) {
        console.error('failed to load ticker frame', err);
      }
    };

    refresh();
    setInterval(refresh, 100);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TickerItem;

    #[test]
    fn dashboard_embeds_state_and_total() {
        let mut data = DashboardData::default();
        data.current_amount = 12.0;
        data.ticker_items.push(TickerItem {
            id: "1".into(),
            content: "</script><b>hi</b>".into(),
            kind: "default".into(),
        });

        let html = render_dashboard(&data);
        assert!(html.contains("$12.00"));
        assert!(html.contains("\"currentAmount\":12.0"));
        assert!(!html.contains("</script><b>"));
    }

    #[test]
    fn dashboard_escapes_symbol_in_total() {
        let data = DashboardData {
            symbol: "<img src=x onerror=alert(1)>".into(),
            ..DashboardData::default()
        };

        let html = render_dashboard(&data);
        assert!(!html.contains(r#"id="total"><img"#));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;0.00"));
        assert!(html.contains("escapeHtml(money(goal.progress))"));
    }
}
