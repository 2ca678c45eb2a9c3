use intent_audit::{
    AuditConfig, AuditRequest, ComparisonMode, DocumentSlot, DocumentUpload, IntentAuditor,
    LastReport, TableSource,
};
use std::env;

const TRACKING_TABLE: &str = "Название,Приоритет,Вид,RU,KZ\n\
                              greet,1,Общий,привет,сәлем\n\
                              order_pizza,2,,хочу пиццу,\n\
                              goodbye,3,общий,пока,сау бол\n";

const BOT_RU: &str = r#"{
  "intents": {
    "greet": {"priority": 1, "samples": [
      {"text": "Привет", "type": "example"},
      {"text": "здравствуй|добрый день", "type": "example"}
    ]},
    "order_pizza": {"priority": 2, "samples": [
      {"text": "хочу пиццу", "type": "example"},
      {"text": "закажи * пиццу", "type": "template"}
    ]},
    "goodbye": {"priority": 4, "samples": [{"text": "пока", "type": "example"}]}
  }
}"#;

const BOT_KZ: &str = r#"{
  "intents": [
    {"name": "greet", "priority": 1, "samples": ["сәлем", "қайырлы күн"]},
    {"name": "goodbye", "priority": 3, "samples": ["сау бол"]}
  ]
}"#;

const BOT_RU_STAGING: &str = r#"[
  {"title": "greet", "priority": 1, "samples": [{"text": "привет"}, {"text": "хай"}]},
  {"title": "goodbye", "priority": 3, "samples": [{"text": "пока"}]}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match env::args().nth(1) {
        Some(path) => AuditConfig::from_path(path)?,
        None => AuditConfig::default(),
    };
    let auditor = IntentAuditor::new(config)?;
    let last = LastReport::new();

    let request = AuditRequest {
        mode: ComparisonMode::Pair4,
        uploads: vec![
            (DocumentSlot::One, DocumentUpload::new("bot_ru.json", BOT_RU)),
            (DocumentSlot::Two, DocumentUpload::new("bot_kz.json", BOT_KZ)),
            (
                DocumentSlot::Three,
                DocumentUpload::new("bot_ru_staging.json", BOT_RU_STAGING),
            ),
        ],
        table: TableSource::Bytes(TRACKING_TABLE.as_bytes().to_vec()),
    };

    let report = match auditor.run(request) {
        Ok(report) => last.replace(report),
        Err(e) => {
            eprintln!("{}", e);
            return Ok(());
        }
    };

    println!("{}", report.to_markdown());

    let out_dir = env::temp_dir().join("intent_audit_result");
    for path in report.write_csv_dir(&out_dir)? {
        println!("wrote {}", path.display());
    }

    Ok(())
}
