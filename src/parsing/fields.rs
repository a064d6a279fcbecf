use indexmap::IndexMap;

/// 规范字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Description,
    Prefix,
    VoiceRate,
    EffectiveDate,
    Comments,
    RoundRules,
    GracePeriod,
    MinimalTime,
    Resolution,
    RateMultiplier,
    RateAddition,
    SurchargeTime,
    SurchargeAmount,
    TimeFromDay,
    TimeToDay,
    TimeFromHour,
    TimeToHour,
    IsSms,
}

impl Field {
    pub fn name(self) -> &'static str {
        self.synonyms()[0]
    }

    /// 同义词表: 第一个是规范名, 其余按优先级排列
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Description => &[
                "description",
                "destination",
                "destination name",
                "dest",
                "country",
            ],
            Field::Prefix => &["prefix", "numbering plan", "code"],
            Field::VoiceRate => &["voice_rate", "rates per minute", "rate", "voice rate"],
            Field::EffectiveDate => &["effective_date", "effective date", "date"],
            Field::Comments => &["comments", "note", "notes", "remark"],
            Field::RoundRules => &["round_rules", "round rules", "rounding"],
            Field::GracePeriod => &["grace_period", "grace period", "waiting time"],
            Field::MinimalTime => &["minimal_time", "minimal time"],
            Field::Resolution => &["resolution"],
            Field::RateMultiplier => &["rate_multiplier", "rate multiplier"],
            Field::RateAddition => &["rate_addition", "rate addition", "additional rate"],
            Field::SurchargeTime => &["surcharge_time", "surcharge time"],
            Field::SurchargeAmount => &["surcharge_amount", "surcharge amount"],
            Field::TimeFromDay => &["time_from_day", "time from day"],
            Field::TimeToDay => &["time_to_day", "time to day"],
            Field::TimeFromHour => &["time_from_hour", "time from hour"],
            Field::TimeToHour => &["time_to_hour", "time to hour"],
            Field::IsSms => &["is_sms", "is sms", "sms"],
        }
    }
}

/// 按同义词顺序查找第一个非空值 (已 trim); 找不到返回 None
///
/// `row` 的 key 必须已经小写并 trim.
pub fn resolve(row: &IndexMap<String, String>, field: Field) -> Option<String> {
    field
        .synonyms()
        .iter()
        .filter_map(|key| row.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
