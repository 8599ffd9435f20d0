use crate::checklist::Checklist;
use crate::models::StatsResponse;
use std::fmt::Write as _;

/// One-shot messages shown after a redirect, carried in `?notice=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ShareLoaded,
    ShareInvalid,
    ShareFailed,
    DaySaved,
    ChecklistReset,
}

impl Notice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "share-loaded" => Some(Self::ShareLoaded),
            "share-invalid" => Some(Self::ShareInvalid),
            "share-failed" => Some(Self::ShareFailed),
            "day-saved" => Some(Self::DaySaved),
            "checklist-reset" => Some(Self::ChecklistReset),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShareLoaded => "share-loaded",
            Self::ShareInvalid => "share-invalid",
            Self::ShareFailed => "share-failed",
            Self::DaySaved => "day-saved",
            Self::ChecklistReset => "checklist-reset",
        }
    }

    pub fn redirect_path(self) -> String {
        format!("/?notice={}", self.as_str())
    }

    fn message(self) -> &'static str {
        match self {
            Self::ShareLoaded => "История из ссылки загружена",
            Self::ShareInvalid => "Не удалось прочитать ссылку: данные повреждены",
            Self::ShareFailed => "Не удалось сохранить историю из ссылки",
            Self::DaySaved => "День сохранён, чек-лист сброшен",
            Self::ChecklistReset => "Чек-лист сброшен",
        }
    }

    fn is_error(self) -> bool {
        matches!(self, Self::ShareInvalid | Self::ShareFailed)
    }
}

pub fn render_index(checklist: &Checklist, stats: &StatsResponse, notice: Option<Notice>) -> String {
    let progress = checklist.progress_percent();
    INDEX_HTML
        .replace("{{NOTICE}}", &render_notice(notice))
        .replace("{{PROGRESS}}", &format!("{progress:.0}"))
        .replace("{{COMPLETED}}", &checklist.completed_count().to_string())
        .replace("{{TOTAL}}", &checklist.total().to_string())
        .replace("{{CHECKLIST}}", &render_checklist(checklist))
        .replace("{{CHART}}", &render_chart(stats))
        .replace("{{AVERAGE}}", &format!("{:.0}", stats.average_percent))
        .replace("{{RECORDED}}", &stats.recorded_days.to_string())
}

fn render_notice(notice: Option<Notice>) -> String {
    match notice {
        Some(notice) => format!(
            r#"<div class="notice" data-type="{}">{}</div>"#,
            if notice.is_error() { "error" } else { "ok" },
            escape_html(notice.message())
        ),
        None => String::new(),
    }
}

fn render_checklist(checklist: &Checklist) -> String {
    let mut html = String::new();
    for item in checklist.items() {
        let id = escape_html(&item.id);
        let _ = write!(
            html,
            r#"<form class="item{checked_class}" method="post" action="/checklist/{id}/toggle">
          <button type="submit" class="check" aria-pressed="{pressed}" aria-label="{label}">{mark}</button>
          <span class="item-label">{label}</span>
        </form>
        "#,
            checked_class = if item.checked { " checked" } else { "" },
            pressed = item.checked,
            mark = if item.checked { "✓" } else { "" },
            label = escape_html(&item.label),
        );
    }
    html
}

fn render_chart(stats: &StatsResponse) -> String {
    let mut html = String::new();
    for day in &stats.last_7_days {
        let short = day.date.get(..5).unwrap_or(&day.date);
        let _ = write!(
            html,
            r#"<div class="bar-slot" title="{date}: {completed} из {total}">
            <span class="bar-value">{percentage}%</span>
            <div class="bar-track"><div class="bar{empty}" style="height: {percentage}%"></div></div>
            <span class="bar-label">{short}</span>
          </div>
          "#,
            date = escape_html(&day.date),
            completed = day.completed_count,
            total = day.total_count,
            percentage = day.percentage,
            empty = if day.total_count == 0 { " empty" } else { "" },
            short = escape_html(short),
        );
    }
    html
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
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

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Ваша помощь бесценна</title>
  <style>
    :root {
      --bg: #f7f5f0;
      --ink: #2b2a28;
      --muted: #6f6a65;
      --primary: #2f4858;
      --accent: #ff6b4a;
      --done: #2ea082;
      --danger: #c63b2b;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(47, 72, 88, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", "Segoe UI", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 28px;
    }

    header {
      text-align: center;
      display: grid;
      gap: 10px;
    }

    .badge {
      justify-self: center;
      background: var(--primary);
      color: white;
      border-radius: 999px;
      padding: 6px 16px;
      font-size: 0.9rem;
    }

    h1 {
      margin: 0;
      font-size: clamp(2rem, 5vw, 3rem);
    }

    h2 {
      margin: 0 0 12px;
    }

    .subtitle {
      margin: 0;
      color: var(--muted);
      font-size: 1.2rem;
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      padding: 22px 24px;
      box-shadow: var(--shadow);
    }

    .card h3 {
      margin: 0 0 8px;
      font-size: 1.1rem;
    }

    .card p {
      margin: 0;
      line-height: 1.55;
    }

    .tips {
      display: grid;
      gap: 16px;
    }

    .card.warning {
      border: 2px solid rgba(198, 59, 43, 0.3);
    }

    .card.warning h3,
    .urgent {
      color: var(--danger);
    }

    .urgent {
      margin-top: 12px;
      padding: 12px;
      border-radius: 12px;
      background: rgba(198, 59, 43, 0.08);
      text-align: center;
      font-weight: 600;
    }

    .progress-track {
      height: 12px;
      border-radius: 999px;
      background: #e4e4e2;
      overflow: hidden;
      margin-top: 12px;
    }

    .progress-fill {
      height: 100%;
      background: linear-gradient(90deg, var(--primary), var(--done));
    }

    .progress-caption {
      text-align: center;
      color: var(--muted);
      font-size: 0.9rem;
    }

    .items {
      display: grid;
      gap: 10px;
      margin: 16px 0;
    }

    .item {
      display: flex;
      align-items: center;
      gap: 12px;
      padding: 12px 14px;
      border-radius: 12px;
      border: 2px solid #ece9e4;
      margin: 0;
    }

    .item.checked {
      border-color: rgba(46, 160, 130, 0.35);
      background: rgba(46, 160, 130, 0.08);
    }

    .item.checked .item-label {
      color: var(--muted);
      text-decoration: line-through;
    }

    .check {
      width: 26px;
      height: 26px;
      border-radius: 6px;
      border: 2px solid var(--primary);
      background: white;
      color: white;
      cursor: pointer;
      font-weight: 700;
    }

    .item.checked .check {
      background: var(--done);
      border-color: var(--done);
    }

    .actions {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 12px;
    }

    .actions form {
      margin: 0;
    }

    .actions button,
    .toolbar button {
      width: 100%;
      border: none;
      border-radius: 12px;
      padding: 12px 16px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
    }

    .btn-save {
      background: var(--primary);
      color: white;
    }

    .btn-reset {
      background: #ece9e4;
      color: var(--ink);
    }

    .chart {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 10px;
      align-items: end;
      margin-top: 12px;
    }

    .bar-slot {
      display: grid;
      gap: 6px;
      text-align: center;
      font-size: 0.8rem;
      color: var(--muted);
    }

    .bar-track {
      height: 140px;
      display: flex;
      align-items: flex-end;
      background: #f1efeb;
      border-radius: 8px;
      overflow: hidden;
    }

    .bar {
      width: 100%;
      background: var(--done);
      min-height: 2px;
    }

    .bar.empty {
      background: #d9d6d0;
    }

    .toolbar {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 12px;
    }

    .toolbar button {
      background: var(--accent);
      color: white;
    }

    .toolbar button:disabled {
      opacity: 0.6;
      cursor: progress;
    }

    .notice,
    .status {
      border-radius: 12px;
      padding: 10px 14px;
      text-align: center;
    }

    .status:empty {
      display: none;
    }

    [data-type="ok"] {
      background: rgba(46, 160, 130, 0.12);
      color: #1f6e58;
    }

    [data-type="error"] {
      background: rgba(198, 59, 43, 0.1);
      color: var(--danger);
    }

    footer {
      text-align: center;
      color: var(--muted);
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <span class="badge">Памятка для родственников</span>
      <h1>ВАША ПОМОЩЬ БЕСЦЕННА</h1>
      <p class="subtitle">Советы родным пациента с гипотиреозом</p>
    </header>

    {{NOTICE}}
    <div class="status" id="status"></div>

    <section class="card">
      <p><strong>Гипотиреоз – это не лень и не плохой характер.</strong> Это болезнь, которая вызывает усталость, забывчивость и подавленность.</p>
    </section>

    <section>
      <h2>ЧТО ВЫ МОЖЕТЕ СДЕЛАТЬ</h2>
      <div class="tips">
        <article class="card">
          <h3>1. БУДЬТЕ «БУДИЛЬНИКОМ»</h3>
          <p>Тактично напоминайте о ежедневном приеме таблетки утром. Можно поставить общее напоминание на телефон.</p>
        </article>
        <article class="card">
          <h3>2. ПОМОГАЙТЕ С ДИЕТОЙ</h3>
          <p>Готовьте вместе полезные блюда с овощами и клетчаткой. Избегайте соблазнов (не покупайте много сладкого и выпечки).</p>
        </article>
        <article class="card">
          <h3>3. БУДЬТЕ ТЕРПЕЛИВЫ</h3>
          <p>Не говорите «возьми себя в руки». Лучше предложите помощь по дому или спокойную совместную прогулку.</p>
        </article>
        <article class="card warning">
          <h3>4. СЛЕДИТЕ ЗА «ТРЕВОЖНЫМИ ЗВОНКАМИ»</h3>
          <p>Вы можете заметить опасные симптомы раньше самого пациента:</p>
          <ul>
            <li>Сильная заторможенность, необычная сонливость, спутанность речи</li>
            <li>Нарастающие отеки на лице</li>
            <li>Жалобы на сильный холод</li>
          </ul>
          <div class="urgent">При этих симптомах – срочно к врачу!</div>
        </article>
        <article class="card">
          <h3>5. ПОДДЕРЖИВАЙТЕ ВИЗИТЫ К ВРАЧУ</h3>
          <p>Помогите записаться, сопроводите. Поддержка на приеме снижает стресс.</p>
        </article>
        <article class="card">
          <h3>6. ХВАЛИТЕ ЗА УСПЕХИ</h3>
          <p>Отметьте, что отеки уменьшились, появилось больше сил. Это лучшая мотивация!</p>
        </article>
      </div>
    </section>

    <div id="report" class="tips">
      <section class="card">
        <h2>ЕЖЕДНЕВНЫЙ ЧЕК-ЛИСТ</h2>
        <p class="subtitle">Отмечайте каждый день для контроля состояния</p>
        <div class="progress-track"><div class="progress-fill" style="width: {{PROGRESS}}%"></div></div>
        <p class="progress-caption">Выполнено: {{COMPLETED}} из {{TOTAL}}</p>
        <div class="items">
          {{CHECKLIST}}
        </div>
        <div class="actions">
          <form method="post" action="/day/save">
            <button class="btn-save" type="submit">Сохранить день и начать новый</button>
          </form>
          <form method="post" action="/checklist/reset">
            <button class="btn-reset" type="submit">Сбросить отметки</button>
          </form>
        </div>
      </section>

      <section class="card">
        <h2>ПОСЛЕДНИЕ 7 ДНЕЙ</h2>
        <p class="subtitle">Средний результат: {{AVERAGE}}% · дней с отметками: {{RECORDED}}</p>
        <div class="chart">
          {{CHART}}
        </div>
      </section>
    </div>

    <section class="toolbar">
      <button type="button" id="share-btn">Поделиться историей</button>
      <button type="button" id="export-btn">Скачать PDF</button>
    </section>

    <section class="card">
      <p style="text-align: center; font-weight: 600;">Ваша поддержка – 50% успеха в лечении!</p>
    </section>

    <footer>
      <p>Консультируйтесь с врачом-эндокринологом для индивидуальных рекомендаций</p>
    </footer>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const shareBtn = document.getElementById('share-btn');
    const exportBtn = document.getElementById('export-btn');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
      if (message) {
        setTimeout(() => setStatus('', ''), 3000);
      }
    };

    const reportShareFailure = async (method, err) => {
      const res = await fetch('/api/share/report', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ method, name: err.name || 'Error', message: err.message || '' })
      });
      if (!res.ok) {
        setStatus('Не удалось поделиться ссылкой', 'error');
        return;
      }
      const body = await res.json();
      if (body.notice) {
        setStatus(body.notice, 'error');
      }
    };

    shareBtn.addEventListener('click', async () => {
      let method = navigator.share ? 'native' : 'clipboard';
      try {
        const res = await fetch(`/api/share?native=${method === 'native'}`);
        if (!res.ok) {
          throw new Error('Unable to build share link');
        }
        const link = await res.json();
        method = link.method;
        if (method === 'native') {
          await navigator.share({ title: link.title, text: link.text, url: link.url });
        } else {
          await navigator.clipboard.writeText(link.url);
          setStatus('Ссылка скопирована', 'ok');
        }
      } catch (err) {
        reportShareFailure(method, err).catch(() => setStatus('Не удалось поделиться ссылкой', 'error'));
      }
    });

    exportBtn.addEventListener('click', async () => {
      if (exportBtn.disabled) {
        return;
      }
      exportBtn.disabled = true;
      setStatus('Готовим PDF...', 'ok');
      try {
        const res = await fetch('/export.pdf');
        if (!res.ok) {
          throw new Error(await res.text());
        }
        const disposition = res.headers.get('content-disposition') || '';
        const match = disposition.match(/filename="([^"]+)"/);
        const blob = await res.blob();
        const url = URL.createObjectURL(blob);
        const link = document.createElement('a');
        link.href = url;
        link.download = match ? match[1] : 'care-checklist.pdf';
        document.body.appendChild(link);
        link.click();
        link.remove();
        URL.revokeObjectURL(url);
        setStatus('PDF сохранён', 'ok');
      } catch (err) {
        setStatus('Не удалось создать PDF', 'error');
      } finally {
        exportBtn.disabled = false;
      }
    });
  </script>
</body>
</html>
"#;
