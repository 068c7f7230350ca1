//! 보스/직업 이름 → FFLogs ID 매핑
//!
//! 사용자가 입력한 이름(약칭 포함)을 FFLogs v1 API의 encounter ID, 난이도, spec ID로 바꿉니다.
//! 이름 비교는 대소문자를 구분하지 않습니다.

use std::collections::HashMap;

/// 보스 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossInfo {
    /// FFLogs Encounter ID
    pub encounter_id: u32,
    /// Difficulty ID (101=Savage, 100=Normal/Ultimate)
    pub difficulty: u32,
    /// 표시 이름
    pub name: &'static str,
}

/// 직업 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobInfo {
    /// FFLogs spec ID
    pub spec_id: u32,
    /// 표시 이름
    pub name: &'static str,
}

lazy_static::lazy_static! {
    /// 별칭 -> 보스
    pub static ref BOSSES: HashMap<&'static str, BossInfo> = {
        let mut m = HashMap::new();

        let sav = |id, name| BossInfo { encounter_id: id, difficulty: 101, name };
        let ult = |id, name| BossInfo { encounter_id: id, difficulty: 100, name };

        // =================================================================
        // Eden's Gate (Savage) - E1S~E4S
        // =================================================================
        for alias in ["e1s", "eden prime"] {
            m.insert(alias, sav(65, "Eden Prime"));
        }
        for alias in ["e2s", "voidwalker"] {
            m.insert(alias, sav(66, "Voidwalker"));
        }
        for alias in ["e3s", "leviathan"] {
            m.insert(alias, sav(67, "Leviathan"));
        }
        for alias in ["e4s", "titan"] {
            m.insert(alias, sav(68, "Titan"));
        }

        // =================================================================
        // Eden's Verse (Savage) - E5S~E8S
        // =================================================================
        for alias in ["e5s", "ramuh"] {
            m.insert(alias, sav(69, "Ramuh"));
        }
        for alias in ["e6s", "ifrit", "garuda", "ifrit and garuda"] {
            m.insert(alias, sav(70, "Ifrit and Garuda"));
        }
        for alias in ["e7s", "idol", "the idol of darkness"] {
            m.insert(alias, sav(71, "The Idol of Darkness"));
        }
        for alias in ["e8s", "shiva"] {
            m.insert(alias, sav(72, "Shiva"));
        }

        // =================================================================
        // Eden's Promise (Savage) - E9S~E12S
        // E12S는 P1(Eden's Promise) / P2(Oracle of Darkness)가 별도 encounter
        // =================================================================
        for alias in ["e9s", "cloud", "cloud of darkness"] {
            m.insert(alias, sav(73, "Cloud of Darkness"));
        }
        for alias in ["e10s", "shadowkeeper"] {
            m.insert(alias, sav(74, "Shadowkeeper"));
        }
        for alias in ["e11s", "fatebreaker"] {
            m.insert(alias, sav(75, "Fatebreaker"));
        }
        for alias in ["e12s", "e12s1", "eden's promise", "promise"] {
            m.insert(alias, sav(76, "Eden's Promise"));
        }
        for alias in ["e12s2", "oracle", "oracle of darkness"] {
            m.insert(alias, sav(77, "Oracle of Darkness"));
        }

        // =================================================================
        // Ultimates
        // =================================================================
        for alias in ["ucob", "bahamut", "the unending coil of bahamut"] {
            m.insert(alias, ult(1047, "The Unending Coil of Bahamut (Ultimate)"));
        }
        for alias in ["uwu", "the weapon's refrain"] {
            m.insert(alias, ult(1048, "The Weapon's Refrain (Ultimate)"));
        }
        for alias in ["tea", "the epic of alexander"] {
            m.insert(alias, ult(1050, "The Epic of Alexander (Ultimate)"));
        }

        m
    };

    /// 별칭 -> 직업
    pub static ref JOBS: HashMap<&'static str, JobInfo> = {
        let mut m = HashMap::new();

        let mut job = |aliases: &[&'static str], spec_id, name| {
            for alias in aliases {
                m.insert(*alias, JobInfo { spec_id, name });
            }
        };

        job(&["ast", "astrologian", "占星", "占星术士"], 1, "Astrologian");
        job(&["brd", "bard", "诗人", "吟游诗人"], 2, "Bard");
        job(&["blm", "black mage", "blackmage", "黑魔", "黑魔法师"], 3, "Black Mage");
        job(&["drk", "dark knight", "darkknight", "暗骑", "暗黑骑士"], 4, "Dark Knight");
        job(&["drg", "dragoon", "龙骑", "龙骑士"], 5, "Dragoon");
        job(&["mch", "machinist", "机工", "机工士"], 6, "Machinist");
        job(&["mnk", "monk", "武僧"], 7, "Monk");
        job(&["nin", "ninja", "忍者"], 8, "Ninja");
        job(&["pld", "paladin", "骑士"], 9, "Paladin");
        job(&["sch", "scholar", "学者"], 10, "Scholar");
        job(&["smn", "summoner", "召唤", "召唤师"], 11, "Summoner");
        job(&["war", "warrior", "战士"], 12, "Warrior");
        job(&["whm", "white mage", "whitemage", "白魔", "白魔法师"], 13, "White Mage");
        job(&["rdm", "red mage", "redmage", "赤魔", "赤魔法师"], 14, "Red Mage");
        job(&["sam", "samurai", "武士"], 15, "Samurai");
        job(&["dnc", "dancer", "舞者"], 16, "Dancer");
        job(&["gnb", "gunbreaker", "绝枪", "绝枪战士"], 17, "Gunbreaker");

        m
    };
}

/// 보스 이름(별칭)으로 조회
pub fn get_boss_info(name: &str) -> Option<&'static BossInfo> {
    BOSSES.get(name.trim().to_lowercase().as_str())
}

/// 직업 이름(별칭)으로 조회
pub fn get_job_info(name: &str) -> Option<&'static JobInfo> {
    JOBS.get(name.trim().to_lowercase().as_str())
}
