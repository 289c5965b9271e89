//! Bundled English stop word list.

/// High-frequency English words carrying little information for
/// fingerprinting. Entries are lowercase and apostrophe-free, matching the
/// output of [`Tokenize`](crate::Tokenize).
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "also", "am", "an", "and",
    "any", "are", "aren", "arent", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cannot", "cant", "could", "couldn",
    "couldnt", "d", "did", "didn", "didnt", "do", "does", "doesn", "doesnt", "doing", "don",
    "dont", "down", "during", "each", "either", "else", "ever", "every", "few", "for", "from",
    "further", "had", "hadn", "hadnt", "has", "hasn", "hasnt", "have", "haven", "havent",
    "having", "he", "hed", "hell", "her", "here", "heres", "hers", "herself", "hes", "him",
    "himself", "his", "how", "hows", "i", "id", "if", "ill", "im", "in", "into", "is", "isn",
    "isnt", "it", "its", "itself", "ive", "just", "ll", "m", "may", "me", "might", "mightn",
    "more", "most", "must", "mustn", "mustnt", "my", "myself", "neither", "no", "nor", "not",
    "now", "o", "of", "off", "on", "once", "only", "or", "other", "ought", "our", "ours",
    "ourselves", "out", "over", "own", "re", "s", "same", "shall", "shan", "shant", "she",
    "shed", "shes", "should", "shouldn", "shouldnt", "so", "some", "such", "t", "than", "that",
    "thats", "the", "their", "theirs", "them", "themselves", "then", "there", "theres",
    "these", "they", "theyd", "theyll", "theyre", "theyve", "this", "those", "through", "to",
    "too", "under", "until", "up", "upon", "us", "ve", "very", "was", "wasn", "wasnt", "we",
    "wed", "were", "weren", "werent", "weve", "what", "whats", "when", "whens", "where",
    "wheres", "which", "while", "who", "whom", "whos", "why", "whys", "will", "with", "won",
    "wont", "would", "wouldn", "wouldnt", "y", "yet", "you", "youd", "youll", "your", "youre",
    "yours", "yourself", "yourselves", "youve",
];
