//! 姓名服务：性别识别与希伯来文名字翻译
//!
//! 只看名（full name 的第一个词），不区分大小写。
//! 用户提交的翻译保存在 `hebrew_names` 表中，启动时载入内存缓存，并优先于内置表。

use std::collections::HashMap;
use std::sync::RwLock;

use phf::{phf_map, phf_set};
use tracing::{debug, info};

use crate::db::{hebrew_name_repo, Database, DatabaseError};
use crate::models::Gender;

/// 编排层对姓名服务的全部依赖
pub trait NameResolution: Send + Sync {
    fn detect_gender(&self, name: &str) -> Gender;

    /// 希伯来文的名；未知时返回 `None`
    fn translate_to_hebrew(&self, name: &str) -> Option<String>;
}

/// 是否包含希伯来字母（U+0590..U+05FF）
pub fn is_hebrew_text(text: &str) -> bool {
    text.chars().any(|c| ('\u{0590}'..='\u{05FF}').contains(&c))
}

fn first_name(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

/// 内置姓名表 + 用户翻译缓存
pub struct NameDirectory {
    db: Option<Database>,
    user_translations: RwLock<HashMap<String, String>>,
}

impl NameDirectory {
    /// 只使用内置表
    pub fn builtin() -> Self {
        Self {
            db: None,
            user_translations: RwLock::new(HashMap::new()),
        }
    }

    /// 载入数据库中的用户翻译，之后的 `save_translation` 会写回数据库
    pub fn load(db: Database) -> Result<Self, DatabaseError> {
        let entries = hebrew_name_repo::list_all(&db)?;
        let count = entries.len();
        let cache = entries
            .into_iter()
            .map(|(english, hebrew)| (english.to_lowercase(), hebrew))
            .collect();
        if count > 0 {
            info!("📖 载入 {} 条希伯来文名字翻译", count);
        }
        Ok(Self {
            db: Some(db),
            user_translations: RwLock::new(cache),
        })
    }

    /// 保存用户提供的翻译（键为小写的名）
    pub fn save_translation(&self, english_name: &str, hebrew_name: &str) -> Result<(), DatabaseError> {
        let key = english_name.trim().to_lowercase();
        let hebrew = hebrew_name.trim().to_string();
        if let Some(db) = &self.db {
            hebrew_name_repo::upsert(db, &key, &hebrew)?;
        }
        debug!("保存名字翻译: {} → {}", key, hebrew);
        self.user_translations
            .write()
            .map_err(|_| DatabaseError::LockPoisoned)?
            .insert(key, hebrew);
        Ok(())
    }

    fn user_translation(&self, key: &str) -> Option<String> {
        self.user_translations
            .read()
            .ok()
            .and_then(|cache| cache.get(key).cloned())
    }
}

impl NameResolution for NameDirectory {
    fn detect_gender(&self, name: &str) -> Gender {
        let Some(first) = first_name(name) else {
            return Gender::Unknown;
        };
        let key = first.to_lowercase();
        let male = MALE_NAMES.contains(key.as_str());
        let female = FEMALE_NAMES.contains(key.as_str());
        let gender = match (male, female) {
            (true, false) => Gender::Male,
            (false, true) => Gender::Female,
            // 两个表都有（如 Adi / שי）或都没有
            _ => Gender::Unknown,
        };
        debug!("性别识别: {} → {}", first, gender);
        gender
    }

    fn translate_to_hebrew(&self, name: &str) -> Option<String> {
        let first = first_name(name)?;
        if is_hebrew_text(first) {
            return Some(first.to_string());
        }
        let key = first.to_lowercase();
        self.user_translation(&key)
            .or_else(|| ENGLISH_TO_HEBREW.get(key.as_str()).map(|h| h.to_string()))
    }
}

/// 常见男性名（希伯来文与拉丁转写）
static MALE_NAMES: phf::Set<&'static str> = phf_set! {
    "אבי", "אביב", "אביגדור", "אביעד", "אבירם", "אבישי", "אברהם", "אדם", "אהרון", "אורי", "אורן",
    "אייל", "איתי", "איתן", "אלון", "אלי", "אליהו", "אמיר", "ארז", "אריאל", "אריה", "אשר", "בועז",
    "בני", "בנימין", "גד", "גדעון", "גיא", "גיל", "גלעד", "דוד", "דור", "דן", "דני", "דניאל",
    "הראל", "זיו", "חי", "חיים", "יאיר", "יגאל", "יהודה", "יהונתן", "יואב", "יובל", "יוחאי",
    "יונתן", "יוסי", "יוסף", "יורם", "ישי", "ישראל", "לירון", "מאור", "מיכאל", "מנחם", "מעיין",
    "משה", "נדב", "נועם", "ניצן", "ניר", "נתן", "עדי", "עידו", "עמית", "עמרי", "ערן", "פלג", "צחי",
    "קובי", "רון", "רועי", "רז", "שגיא", "שחר", "שי", "שלומי", "שלמה", "שמואל", "שמעון", "תום",
    "תומר",
    "adi", "alon", "amir", "amit", "ariel", "avi", "aviv", "boaz", "dan", "dani", "daniel", "david",
    "dor", "eli", "eran", "erez", "eyal", "gad", "gideon", "gil", "guy", "hai", "haim", "ido",
    "itai", "itan", "kobi", "moshe", "nadav", "natan", "nir", "nitzan", "noam", "omri", "raz",
    "roi", "ron", "shai", "tom", "tomer", "yair", "yoav", "yonatan", "yosef", "yossi", "yuval",
    "ziv",
    // 常见英文名
    "bob", "john", "james", "robert", "william", "michael", "thomas", "mark", "paul", "peter",
    "steven", "kevin", "brian", "jason", "ryan", "eric", "matthew", "andrew", "joshua",
};

/// 常见女性名（希伯来文与拉丁转写）
static FEMALE_NAMES: phf::Set<&'static str> = phf_set! {
    "אביגיל", "אבישג", "אורה", "אורית", "אורלי", "אילנה", "אילת", "איריס", "אסתר", "אפרת", "ברכה",
    "גאולה", "גילה", "דבורה", "דליה", "דנה", "דנית", "דפנה", "הגר", "הדס", "הדסה", "הילה", "חגית",
    "חוה", "חנה", "טל", "טלי", "יהודית", "יעל", "יפה", "יפית", "ירדן", "ירדנה", "כרמית", "כרמל",
    "לאה", "לי", "ליאור", "ליאורה", "ליאת", "לימור", "לירון", "מאיה", "מור", "מורן", "מיכל", "מירב",
    "מירי", "מיתר", "נגה", "נועה", "נופר", "נורית", "נטלי", "סיגל", "סיון", "עדי", "עדן", "עדנה",
    "ענבל", "ענת", "עפרה", "פנינה", "צופיה", "קרן", "רבקה", "רוית", "רונית", "רות", "רחל", "רינת",
    "שולמית", "שחר", "שי", "שיר", "שירה", "שירי", "שלומית", "שני", "שרה", "שרון", "תאיר", "תהילה",
    "תמי", "תמר",
    "adi", "anat", "avigail", "carmel", "chana", "dafna", "dalia", "dana", "danit", "eden", "efrat",
    "gila", "hadas", "hagar", "hagit", "hava", "hila", "ilana", "inbal", "iris", "keren", "lee",
    "liat", "limor", "lior", "liora", "maya", "merav", "michal", "miri", "mor", "moran", "natali",
    "noa", "nofar", "noga", "ofra", "orit", "orli", "rachel", "rinat", "rivka", "ronit", "ruth",
    "sara", "shani", "sharon", "shir", "shira", "shiri", "sigal", "sivan", "tahel", "tal", "tali",
    "tamar", "tami", "yael", "yarden",
    // 常见英文名
    "mary", "sarah", "emily", "jessica", "jennifer", "emma", "olivia", "anna", "laura", "rebecca",
    "lisa", "julia", "hannah",
};

/// 英文名 → 希伯来文
static ENGLISH_TO_HEBREW: phf::Map<&'static str, &'static str> = phf_map! {
    "aaron" => "אהרון",
    "abigail" => "אביגיל",
    "abraham" => "אברהם",
    "adam" => "אדם",
    "adara" => "אדרה",
    "adi" => "עדי",
    "adina" => "עדינה",
    "adir" => "אדיר",
    "adva" => "אדוה",
    "agam" => "אגם",
    "aharon" => "אהרון",
    "ahava" => "אהבה",
    "ahuva" => "אהובה",
    "akiva" => "עקיבא",
    "aliya" => "עליה",
    "aliza" => "עליזה",
    "alma" => "עלמה",
    "almog" => "אלמוג",
    "alon" => "אלון",
    "alona" => "אלונה",
    "ami" => "עמי",
    "amichai" => "עמיחי",
    "amir" => "אמיר",
    "amit" => "עמית",
    "amnon" => "אמנון",
    "amos" => "עמוס",
    "amram" => "עמרם",
    "anan" => "ענן",
    "anat" => "ענת",
    "arie" => "אריה",
    "ariel" => "אריאל",
    "arik" => "אריק",
    "arye" => "אריה",
    "asa" => "אסא",
    "asaf" => "אסף",
    "asher" => "אשר",
    "atalia" => "עתליה",
    "atara" => "עטרה",
    "avi" => "אבי",
    "avia" => "אביה",
    "aviad" => "אביעד",
    "avidan" => "אבידן",
    "aviel" => "אביאל",
    "avigail" => "אביגיל",
    "avigdor" => "אביגדור",
    "avihu" => "אביהוא",
    "aviram" => "אבירם",
    "avishag" => "אבישג",
    "avishai" => "אבישי",
    "avital" => "אביטל",
    "aviv" => "אביב",
    "aviva" => "אביבה",
    "avner" => "אבנר",
    "avraham" => "אברהם",
    "avram" => "אברם",
    "avshalom" => "אבשלום",
    "ayal" => "איל",
    "ayala" => "איילה",
    "ayelet" => "איילת",
    "azaria" => "עזריה",
    "bar" => "בר",
    "barak" => "ברק",
    "baruch" => "ברוך",
    "batel" => "בת־אל",
    "batsheva" => "בת־שבע",
    "batya" => "בתיה",
    "beeri" => "בארי",
    "benaya" => "בניה",
    "beni" => "בני",
    "benjamin" => "בנימין",
    "benny" => "בני",
    "beracha" => "ברכה",
    "binyamin" => "בנימין",
    "boaz" => "בועז",
    "bosmat" => "בשמת",
    "bracha" => "ברכה",
    "carmel" => "כרמל",
    "carmit" => "כרמית",
    "chaim" => "חיים",
    "chana" => "חנה",
    "chava" => "חוה",
    "chaya" => "חיה",
    "chen" => "חן",
    "chesed" => "חסד",
    "dafna" => "דפנה",
    "dalia" => "דליה",
    "dalit" => "דלית",
    "dan" => "דן",
    "dana" => "דנה",
    "dani" => "דני",
    "daniel" => "דניאל",
    "daniela" => "דניאלה",
    "danit" => "דנית",
    "danny" => "דני",
    "danya" => "דניה",
    "daphne" => "דפנה",
    "dar" => "דר",
    "david" => "דוד",
    "deborah" => "דבורה",
    "dekel" => "דקל",
    "dikla" => "דקלה",
    "dina" => "דינה",
    "dor" => "דור",
    "dori" => "דורי",
    "dorit" => "דורית",
    "doron" => "דורון",
    "dov" => "דוב",
    "dror" => "דרור",
    "drorit" => "דרורית",
    "dvora" => "דבורה",
    "eden" => "עדן",
    "edna" => "עדנה",
    "efraim" => "אפרים",
    "efrat" => "אפרת",
    "ehud" => "אהוד",
    "eilat" => "אילת",
    "eilon" => "אילון",
    "eitan" => "איתן",
    "elazar" => "אלעזר",
    "elchanan" => "אלחנן",
    "eldad" => "אלדד",
    "eli" => "אלי",
    "eliana" => "אליענה",
    "eliav" => "אליאב",
    "eliezer" => "אליעזר",
    "elijah" => "אליהו",
    "elior" => "אליאור",
    "eliora" => "אליאורה",
    "elisheva" => "אלישבע",
    "eliya" => "אליה",
    "eliyahu" => "אליהו",
    "ephraim" => "אפרים",
    "eran" => "ערן",
    "erez" => "ארז",
    "ester" => "אסתר",
    "esther" => "אסתר",
    "ethan" => "איתן",
    "eve" => "חוה",
    "eviatar" => "אביתר",
    "evyatar" => "אביתר",
    "eyal" => "איל",
    "eytan" => "איתן",
    "ezra" => "עזרא",
    "gad" => "גד",
    "gai" => "גיא",
    "gal" => "גל",
    "gali" => "גלי",
    "galia" => "גליה",
    "galit" => "גלית",
    "gavriel" => "גבריאל",
    "gaya" => "גאיה",
    "gefen" => "גפן",
    "geula" => "גאולה",
    "gideon" => "גדעון",
    "gidon" => "גדעון",
    "gil" => "גיל",
    "gila" => "גילה",
    "gilad" => "גלעד",
    "gili" => "גילי",
    "guy" => "גיא",
    "hadar" => "הדר",
    "hadas" => "הדס",
    "hadasa" => "הדסה",
    "hadassa" => "הדסה",
    "hadassah" => "הדסה",
    "hagar" => "הגר",
    "hagit" => "חגית",
    "hai" => "חי",
    "haim" => "חיים",
    "hallel" => "הלל",
    "hana" => "חנה",
    "hannah" => "חנה",
    "harel" => "הראל",
    "hava" => "חוה",
    "hayim" => "חיים",
    "hed" => "הד",
    "herut" => "חרות",
    "hevel" => "הבל",
    "hila" => "הילה",
    "hili" => "הילי",
    "hillel" => "הלל",
    "hodia" => "הודיה",
    "hyam" => "חיים",
    "idan" => "עידן",
    "ido" => "עידו",
    "ilai" => "עילאי",
    "ilan" => "אילן",
    "ilana" => "אילנה",
    "ilanit" => "אילנית",
    "ilat" => "אילת",
    "immanuel" => "עמנואל",
    "imri" => "אמרי",
    "inbal" => "ענבל",
    "inbar" => "ענבר",
    "ira" => "עירא",
    "iris" => "איריס",
    "irit" => "עירית",
    "israel" => "ישראל",
    "itai" => "איתי",
    "itamar" => "איתמר",
    "itan" => "איתן",
    "itay" => "איתי",
    "itzhak" => "יצחק",
    "iyov" => "איוב",
    "jardena" => "ירדנה",
    "jonathan" => "יונתן",
    "joseph" => "יוסף",
    "judith" => "יהודית",
    "karmel" => "כרמל",
    "kelila" => "כלילה",
    "keren" => "קרן",
    "keshet" => "קשת",
    "kfir" => "כפיר",
    "kineret" => "כנרת",
    "kobi" => "קובי",
    "lavi" => "לביא",
    "lea" => "לאה",
    "leah" => "לאה",
    "lee" => "לי",
    "lev" => "לב",
    "levana" => "לבנה",
    "levi" => "לוי",
    "li" => "לי",
    "lian" => "ליאן",
    "liat" => "ליאת",
    "libi" => "ליבי",
    "liel" => "ליאל",
    "lihi" => "ליהי",
    "lilach" => "לילך",
    "limor" => "לימור",
    "lior" => "ליאור",
    "liora" => "ליאורה",
    "liorit" => "ליאורית",
    "liraz" => "לירז",
    "liron" => "לירון",
    "lital" => "ליטל",
    "livna" => "לבנה",
    "livnat" => "לבנת",
    "maayan" => "מעיין",
    "malachi" => "מלאכי",
    "malka" => "מלכה",
    "maor" => "מאור",
    "margalit" => "מרגלית",
    "matan" => "מתן",
    "matityahu" => "מתתיהו",
    "maya" => "מאיה",
    "meir" => "מאיר",
    "meira" => "מאירה",
    "meirit" => "מאירית",
    "meital" => "מיטל",
    "melech" => "מלך",
    "menachem" => "מנחם",
    "menahem" => "מנחם",
    "menashe" => "מנשה",
    "menuha" => "מנוחה",
    "merav" => "מירב",
    "meshulam" => "משולם",
    "meyer" => "מאיר",
    "michael" => "מיכאל",
    "michaela" => "מיכאלה",
    "michal" => "מיכל",
    "mikhael" => "מיכאל",
    "miri" => "מירי",
    "miriam" => "מרים",
    "mirit" => "מירית",
    "miron" => "מירון",
    "miryam" => "מרים",
    "mor" => "מור",
    "moran" => "מורן",
    "mordecai" => "מרדכי",
    "moria" => "מוריה",
    "moshe" => "משה",
    "moti" => "מוטי",
    "naama" => "נעמה",
    "nachman" => "נחמן",
    "nachum" => "נחום",
    "nadav" => "נדב",
    "naftali" => "נפתלי",
    "nahal" => "נחל",
    "naomi" => "נעמי",
    "natali" => "נטלי",
    "natalie" => "נטלי",
    "natan" => "נתן",
    "nathan" => "נתן",
    "nava" => "נאוה",
    "nechama" => "נחמה",
    "nehorai" => "נהוראי",
    "neria" => "נריה",
    "neta" => "נטע",
    "netanel" => "נתנאל",
    "netta" => "נטע",
    "nili" => "נילי",
    "nir" => "ניר",
    "nitai" => "ניתאי",
    "nitza" => "ניצה",
    "nitzan" => "ניצן",
    "niv" => "ניב",
    "noa" => "נועה",
    "noach" => "נח",
    "noah" => "נועה",
    "noam" => "נועם",
    "nofar" => "נופר",
    "noga" => "נגה",
    "noy" => "נוי",
    "noya" => "נויה",
    "nurit" => "נורית",
    "odelia" => "אודליה",
    "ofek" => "אופק",
    "ofer" => "עופר",
    "ofir" => "אופיר",
    "ofira" => "אופירה",
    "ofra" => "עפרה",
    "ofri" => "עפרי",
    "ohad" => "אוהד",
    "omer" => "עומר",
    "omri" => "עמרי",
    "ophir" => "אופיר",
    "or" => "אור",
    "ora" => "אורה",
    "orel" => "אוראל",
    "oren" => "אורן",
    "ori" => "אורי",
    "orit" => "אורית",
    "orli" => "אורלי",
    "orna" => "ארנה",
    "osher" => "אושר",
    "oz" => "עוז",
    "paz" => "פז",
    "peleg" => "פלג",
    "pnina" => "פנינה",
    "raanan" => "רענן",
    "rachel" => "רחל",
    "rani" => "רני",
    "ravid" => "רביד",
    "ravit" => "רוית",
    "raz" => "רז",
    "rebecca" => "רבקה",
    "reuben" => "ראובן",
    "reut" => "רעות",
    "rina" => "רינה",
    "rinat" => "רינת",
    "rivka" => "רבקה",
    "roi" => "רועי",
    "rom" => "רום",
    "romi" => "רומי",
    "ron" => "רון",
    "rona" => "רונה",
    "ronen" => "רונן",
    "roni" => "רוני",
    "ronit" => "רונית",
    "rotem" => "רותם",
    "roy" => "רועי",
    "rut" => "רות",
    "ruth" => "רות",
    "saar" => "סער",
    "sagi" => "שגיא",
    "sagit" => "שגית",
    "samuel" => "שמואל",
    "sapir" => "ספיר",
    "sara" => "שרה",
    "sarah" => "שרה",
    "sarit" => "שרית",
    "shachar" => "שחר",
    "shai" => "שי",
    "shaked" => "שקד",
    "shalev" => "שלו",
    "shalom" => "שלום",
    "shamira" => "שמירה",
    "shani" => "שני",
    "sharon" => "שרון",
    "shaul" => "שאול",
    "shay" => "שי",
    "shifra" => "שפרה",
    "shimon" => "שמעון",
    "shimshon" => "שמשון",
    "shir" => "שיר",
    "shira" => "שירה",
    "shiri" => "שירי",
    "shirli" => "שירלי",
    "shlomi" => "שלומי",
    "shlomit" => "שלומית",
    "shlomo" => "שלמה",
    "shmuel" => "שמואל",
    "shoshana" => "שושנה",
    "shulamit" => "שולמית",
    "sigal" => "סיגל",
    "simcha" => "שמחה",
    "simon" => "שמעון",
    "sivan" => "סיון",
    "smadar" => "סמדר",
    "solomon" => "שלמה",
    "sophia" => "צופיה",
    "stav" => "סתיו",
    "tahel" => "תהל",
    "tair" => "תאיר",
    "tal" => "טל",
    "tali" => "טלי",
    "talia" => "טליה",
    "tam" => "תם",
    "tamar" => "תמר",
    "tami" => "תמי",
    "tamir" => "תמיר",
    "tehila" => "תהילה",
    "tikva" => "תקוה",
    "tirtza" => "תרצה",
    "tohar" => "טוהר",
    "tom" => "תום",
    "tomer" => "תומר",
    "tova" => "טובה",
    "tovia" => "טוביה",
    "tuvya" => "טוביה",
    "tzachi" => "צחי",
    "tzafrir" => "צפריר",
    "tzila" => "צילה",
    "tzion" => "ציון",
    "tzipora" => "ציפורה",
    "tzippora" => "ציפורה",
    "tzivya" => "צביה",
    "tzofia" => "צופיה",
    "tzvi" => "צבי",
    "tzvia" => "צביה",
    "udi" => "אודי",
    "uri" => "אורי",
    "uria" => "אוריה",
    "uriel" => "אוריאל",
    "uzi" => "עוזי",
    "varda" => "ורדה",
    "vered" => "ורד",
    "yaakov" => "יעקב",
    "yaara" => "יערה",
    "yael" => "יעל",
    "yaen" => "יען",
    "yafa" => "יפה",
    "yafit" => "יפית",
    "yahav" => "יהב",
    "yair" => "יאיר",
    "yakira" => "יקירה",
    "yakov" => "יעקב",
    "yali" => "יהלי",
    "yam" => "ים",
    "yanai" => "ינאי",
    "yaniv" => "יניב",
    "yarden" => "ירדן",
    "yardena" => "ירדנה",
    "yaron" => "ירון",
    "yarona" => "ירונה",
    "yasmin" => "יסמין",
    "yechezkel" => "יחזקאל",
    "yechiel" => "יחיאל",
    "yedidya" => "ידידיה",
    "yehonatan" => "יהונתן",
    "yehoshua" => "יהושע",
    "yehuda" => "יהודה",
    "yehudi" => "יהודי",
    "yehudit" => "יהודית",
    "yemima" => "ימימה",
    "yeshayahu" => "ישעיהו",
    "yiftach" => "יפתח",
    "yigal" => "יגאל",
    "yinon" => "ינון",
    "yishai" => "ישי",
    "yisrael" => "ישראל",
    "yissakhar" => "יששכר",
    "yitzhak" => "יצחק",
    "yoav" => "יואב",
    "yochai" => "יוחאי",
    "yochanan" => "יוחנן",
    "yocheved" => "יוכבד",
    "yoel" => "יואל",
    "yona" => "יונה",
    "yonatan" => "יונתן",
    "yoni" => "יוני",
    "yonina" => "יונינה",
    "yonit" => "יונית",
    "yoram" => "יורם",
    "yosef" => "יוסף",
    "yosi" => "יוסי",
    "yossi" => "יוסי",
    "yuli" => "יולי",
    "yuval" => "יובל",
    "zahara" => "זהרה",
    "zeev" => "זאב",
    "ziv" => "זיו",
    "ziva" => "זיוה",
    "zivit" => "זיוית",
    "zohar" => "זוהר",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_gender_from_first_name() {
        let names = NameDirectory::builtin();
        assert_eq!(names.detect_gender("Tomer Cohen"), Gender::Male);
        assert_eq!(names.detect_gender("yael levi"), Gender::Female);
        assert_eq!(names.detect_gender("מיכל כהן"), Gender::Female);
        assert_eq!(names.detect_gender("Xander Smith"), Gender::Unknown);
        assert_eq!(names.detect_gender("   "), Gender::Unknown);
    }

    #[test]
    fn names_in_both_tables_are_unknown() {
        let names = NameDirectory::builtin();
        assert_eq!(names.detect_gender("Adi Golan"), Gender::Unknown);
        assert_eq!(names.detect_gender("שחר"), Gender::Unknown);
    }

    #[test]
    fn translates_builtin_and_hebrew_names() {
        let names = NameDirectory::builtin();
        assert_eq!(names.translate_to_hebrew("Daniel Katz").as_deref(), Some("דניאל"));
        assert_eq!(names.translate_to_hebrew("דנה לוי").as_deref(), Some("דנה"));
        assert_eq!(names.translate_to_hebrew("Bob Wilson"), None);
        assert_eq!(names.translate_to_hebrew(""), None);
    }

    #[test]
    fn user_translations_persist_and_override() {
        let db = Database::open_in_memory().unwrap();
        let names = NameDirectory::load(db.clone()).unwrap();

        names.save_translation("Bob", "בוב").unwrap();
        names.save_translation("Daniel", "דני").unwrap();
        assert_eq!(names.translate_to_hebrew("bob wilson").as_deref(), Some("בוב"));
        assert_eq!(names.translate_to_hebrew("Daniel").as_deref(), Some("דני"));

        let reloaded = NameDirectory::load(db).unwrap();
        assert_eq!(reloaded.translate_to_hebrew("BOB").as_deref(), Some("בוב"));
    }

    #[test]
    fn hebrew_text_detection() {
        assert!(is_hebrew_text("שלום {name}"));
        assert!(!is_hebrew_text("Hello {name}"));
    }
}
